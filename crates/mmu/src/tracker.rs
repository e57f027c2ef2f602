//! Per-client tracking of in-flight mapping requests.

use alloc::{boxed::Box, collections::VecDeque};
use core::fmt;

use crate::{MappingRequest, MappingResponse, Port};

/// Receives the responses to tracked requests.
pub type ResponseConsumer = Box<dyn FnMut(MappingResponse)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SendMode {
    Tracked,
    Untracked,
}

/// Wraps a client's port to the router and counts the tracked requests still waiting
/// for a response.
///
/// Responses arrive in the order their requests were sent, so each one is matched to
/// the oldest outstanding request. Untracked requests (setup, bulk preloads) never touch
/// the pending count and their responses are dropped.
pub struct RequestTracker {
    port: Port<MappingRequest, MappingResponse>,
    modes: VecDeque<SendMode>,
    pending: usize,
    consumer: Option<ResponseConsumer>,
}

impl RequestTracker {
    /// Creates a tracker that discards every response once it is counted.
    pub fn new(port: Port<MappingRequest, MappingResponse>) -> Self {
        Self {
            port,
            modes: VecDeque::new(),
            pending: 0,
            consumer: None,
        }
    }

    /// Creates a tracker that hands the responses to tracked requests to `consumer`.
    pub fn with_consumer(
        port: Port<MappingRequest, MappingResponse>,
        consumer: ResponseConsumer,
    ) -> Self {
        Self {
            consumer: Some(consumer),
            ..Self::new(port)
        }
    }

    /// Sends a request and counts it as pending until its response arrives.
    pub fn send_tracked(&mut self, request: MappingRequest) {
        self.pending += 1;
        self.modes.push_back(SendMode::Tracked);
        log::debug!("Sending tracked request: {}", request);
        self.port.send(request);
    }

    /// Sends a request without counting it.
    pub fn send_untracked(&mut self, request: MappingRequest) {
        self.modes.push_back(SendMode::Untracked);
        log::debug!("Sending untracked request: {}", request);
        self.port.send(request);
    }

    /// Handles every response waiting on the port and returns how many there were.
    ///
    /// # Panics
    /// If a response arrives with no request outstanding. That can only happen if
    /// something else sent on this tracker's port, and the count would be wrong from then on.
    pub fn poll(&mut self) -> usize {
        let mut observed = 0;
        while let Some(response) = self.port.recv() {
            self.on_response(response);
            observed += 1;
        }
        observed
    }

    fn on_response(&mut self, response: MappingResponse) {
        log::debug!("Got mapping response: {}", response);

        let mode = self
            .modes
            .pop_front()
            .unwrap_or_else(|| panic!("response with no outstanding request: {}", response));

        match mode {
            SendMode::Untracked => {}
            SendMode::Tracked => {
                self.pending = self
                    .pending
                    .checked_sub(1)
                    .unwrap_or_else(|| panic!("pending request count went negative"));
                if let Some(consumer) = self.consumer.as_mut() {
                    consumer(response);
                }
            }
        }
    }

    /// Returns the number of tracked requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.pending
    }

    /// Returns true if no request of either kind is outstanding.
    pub fn is_idle(&self) -> bool {
        self.modes.is_empty()
    }
}

impl fmt::Debug for RequestTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestTracker")
            .field("port", &self.port)
            .field("outstanding", &self.modes.len())
            .field("pending", &self.pending)
            .field("consumer", &self.consumer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{Link, SpaceId};

    fn answer_all(server: &Port<MappingResponse, MappingRequest>) {
        while let Some(request) = server.recv() {
            server.send(MappingResponse::completed(request));
        }
    }

    #[test]
    fn counts_tracked_requests_until_answered() {
        let (client, server) = Link::duplex("os");
        let mut tracker = RequestTracker::new(client);

        tracker.send_tracked(MappingRequest::map(0, 0x6000, 0xF6000, 0));
        tracker.send_tracked(MappingRequest::map(0, 0x7000, 0xF7000, 0));
        assert_eq!(tracker.pending_count(), 2);

        answer_all(&server);
        assert_eq!(tracker.poll(), 2);
        assert_eq!(tracker.pending_count(), 0);
        assert!(tracker.is_idle());
    }

    #[test]
    fn untracked_requests_do_not_count() {
        let (client, server) = Link::duplex("os");
        let mut tracker = RequestTracker::new(client);

        tracker.send_untracked(MappingRequest::CreateSpace(SpaceId::new(0)));
        tracker.send_untracked(MappingRequest::map(0, 0x4000, 0xF4000, 0));
        tracker.send_tracked(MappingRequest::map(0, 0x6000, 0xF6000, 0));
        assert_eq!(tracker.pending_count(), 1);
        assert!(!tracker.is_idle());

        answer_all(&server);
        assert_eq!(tracker.poll(), 3);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    fn consumer_sees_only_tracked_responses() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let (client, server) = Link::duplex("os");
        let mut tracker = RequestTracker::with_consumer(
            client,
            Box::new(move |response: MappingResponse| sink.borrow_mut().push(response)),
        );

        tracker.send_untracked(MappingRequest::map(0, 0x4000, 0xF4000, 0));
        tracker.send_tracked(MappingRequest::unmap(0, 0x4000, 0));
        answer_all(&server);
        tracker.poll();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].request, MappingRequest::unmap(0, 0x4000, 0));
    }

    #[test]
    fn poll_with_nothing_waiting() {
        let (client, _server) = Link::duplex("os");
        let mut tracker = RequestTracker::new(client);
        assert_eq!(tracker.poll(), 0);
        assert_eq!(tracker.pending_count(), 0);
    }

    #[test]
    #[should_panic(expected = "no outstanding request")]
    fn unmatched_response_panics() {
        let (client, server) = Link::duplex("os");
        let mut tracker = RequestTracker::new(client);
        server.send(MappingResponse::completed(MappingRequest::CreateSpace(
            SpaceId::new(0),
        )));
        tracker.poll();
    }
}
