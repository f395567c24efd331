use crate::common::{ConnectionRequest, UserId, UserProfile};

/// Candidate profiles to review, front first.
#[derive(Debug, Clone, Default)]
pub struct FeedStore {
    candidates: Vec<UserProfile>,
}

impl FeedStore {
    pub fn replace(&mut self, candidates: Vec<UserProfile>) {
        self.candidates = candidates;
    }

    /// Removes a candidate as soon as a decision is taken, before the
    /// request reaches the server.
    pub fn remove(&mut self, user_id: &UserId) -> Option<UserProfile> {
        let index = self
            .candidates
            .iter()
            .position(|candidate| &candidate.id == user_id)?;
        Some(self.candidates.remove(index))
    }

    pub fn current(&self) -> Option<&UserProfile> {
        self.candidates.first()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn clear(&mut self) {
        self.candidates.clear();
    }
}

/// Connection requests received by the session user.
#[derive(Debug, Clone, Default)]
pub struct RequestStore {
    received: Vec<ConnectionRequest>,
}

impl RequestStore {
    pub fn replace(&mut self, received: Vec<ConnectionRequest>) {
        self.received = received;
    }

    pub fn remove(&mut self, request_id: &str) {
        self.received.retain(|request| request.id != request_id);
    }

    pub fn received(&self) -> &[ConnectionRequest] {
        &self.received
    }

    pub fn clear(&mut self) {
        self.received.clear();
    }
}

/// Accepted connections of the session user.
#[derive(Debug, Clone, Default)]
pub struct ConnectionList {
    connections: Vec<UserProfile>,
}

impl ConnectionList {
    pub fn replace(&mut self, connections: Vec<UserProfile>) {
        self.connections = connections;
    }

    pub fn all(&self) -> &[UserProfile] {
        &self.connections
    }

    pub fn clear(&mut self) {
        self.connections.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> UserProfile {
        serde_json::from_value(serde_json::json!({ "_id": id })).unwrap()
    }

    #[test]
    fn feed_removal_advances_to_next_candidate() {
        let mut feed = FeedStore::default();
        feed.replace(vec![profile("a"), profile("b")]);
        assert_eq!(feed.remove(&"a".into()).map(|p| p.id), Some("a".into()));
        assert_eq!(feed.current().map(|p| p.id.as_str()), Some("b"));
        assert!(feed.remove(&"a".into()).is_none());
    }

    #[test]
    fn request_removal_by_id() {
        let mut requests = RequestStore::default();
        requests.replace(vec![
            ConnectionRequest {
                id: "r1".to_string(),
                from_user_id: profile("a"),
            },
            ConnectionRequest {
                id: "r2".to_string(),
                from_user_id: profile("b"),
            },
        ]);
        requests.remove("r1");
        assert_eq!(requests.received().len(), 1);
        assert_eq!(requests.received()[0].id, "r2");
    }
}
