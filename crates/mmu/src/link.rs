//! In-process message links.
//!
//! A [`Link`] connects two [`Port`]s. Whatever one port sends, the other receives, exactly
//! once and in the order it was sent. Each direction has its own queue, so traffic one way
//! never reorders traffic the other way. The two directions may carry different types, as
//! with requests going out and responses coming back.

use alloc::{collections::VecDeque, sync::Arc};
use core::fmt;

use spin::Mutex;

type Queue<T> = Arc<Mutex<VecDeque<T>>>;

/// Factory for connected port pairs.
pub struct Link;

impl Link {
    /// Creates two connected ports carrying the same type both ways.
    ///
    /// The name is only used in log output.
    pub fn pair<T>(name: &str) -> (Port<T>, Port<T>) {
        Self::duplex(name)
    }

    /// Creates two connected ports. The first sends `A` and receives `B`; the second the
    /// reverse.
    pub fn duplex<A, B>(name: &str) -> (Port<A, B>, Port<B, A>) {
        let name: Arc<str> = Arc::from(name);
        let a_to_b: Queue<A> = Arc::new(Mutex::new(VecDeque::new()));
        let b_to_a: Queue<B> = Arc::new(Mutex::new(VecDeque::new()));

        let a = Port {
            name: name.clone(),
            outbound: a_to_b.clone(),
            inbound: b_to_a.clone(),
        };
        let b = Port {
            name,
            outbound: b_to_a,
            inbound: a_to_b,
        };
        (a, b)
    }
}

/// One end of a [`Link`], sending `Tx` and receiving `Rx`.
pub struct Port<Tx, Rx = Tx> {
    name: Arc<str>,
    outbound: Queue<Tx>,
    inbound: Queue<Rx>,
}

impl<Tx, Rx> Port<Tx, Rx> {
    /// Returns the name of the link this port belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends a value to the other end of the link.
    pub fn send(&self, value: Tx) {
        self.outbound.lock().push_back(value);
    }

    /// Receives the oldest value sent by the other end, if any.
    pub fn recv(&self) -> Option<Rx> {
        self.inbound.lock().pop_front()
    }

    /// Returns the number of values waiting to be received.
    pub fn pending(&self) -> usize {
        self.inbound.lock().len()
    }
}

impl<Tx, Rx> fmt::Debug for Port<Tx, Rx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("name", &self.name)
            .field("pending", &self.pending())
            .finish()
    }
}
