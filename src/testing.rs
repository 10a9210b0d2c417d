//! Recording tunnels for unit tests

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    rc::Rc,
};

use crate::{
    SyncMessage, UpdateMessage, connection::ConnectionId, player::PlayerMessage, session::Tunnel,
};

#[derive(Default)]
struct HubState {
    live: HashSet<ConnectionId>,
    updates: HashMap<ConnectionId, Vec<UpdateMessage>>,
    states: HashMap<ConnectionId, Vec<SyncMessage>>,
}

/// Routes `log` output through the test harness, once per process
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fake transport that records everything sent to each connection
#[derive(Default)]
pub struct Hub {
    inner: Rc<RefCell<HubState>>,
}

pub struct MockTunnel {
    id: ConnectionId,
    inner: Rc<RefCell<HubState>>,
}

impl Tunnel for MockTunnel {
    fn send_message(&self, message: &UpdateMessage) {
        self.inner
            .borrow_mut()
            .updates
            .entry(self.id)
            .or_default()
            .push(message.clone());
    }

    fn send_state(&self, state: &SyncMessage) {
        self.inner
            .borrow_mut()
            .states
            .entry(self.id)
            .or_default()
            .push(state.clone());
    }
}

impl Hub {
    /// Opens a tunnel for a fresh connection id
    pub fn connect(&self) -> ConnectionId {
        let id = ConnectionId::new();
        self.inner.borrow_mut().live.insert(id);
        id
    }

    /// Makes the connection's tunnel unreachable, as if the socket died
    pub fn drop_tunnel(&self, id: ConnectionId) {
        self.inner.borrow_mut().live.remove(&id);
    }

    pub fn finder(&self) -> impl Fn(ConnectionId) -> Option<MockTunnel> + '_ {
        move |id| {
            self.inner
                .borrow()
                .live
                .contains(&id)
                .then(|| MockTunnel {
                    id,
                    inner: Rc::clone(&self.inner),
                })
        }
    }

    pub fn updates(&self, id: ConnectionId) -> Vec<UpdateMessage> {
        self.inner
            .borrow()
            .updates
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn states(&self, id: ConnectionId) -> Vec<SyncMessage> {
        self.inner
            .borrow()
            .states
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// The most recent roster broadcast the connection received
    pub fn last_players(&self, id: ConnectionId) -> Option<Vec<PlayerMessage>> {
        self.updates(id).into_iter().rev().find_map(|m| match m {
            UpdateMessage::Players(players) => Some(players),
            UpdateMessage::GameClosed(_) => None,
        })
    }

    /// Forgets everything recorded so far
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.updates.clear();
        inner.states.clear();
    }
}
