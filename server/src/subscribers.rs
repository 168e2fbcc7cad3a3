//! Addresses subscribed to generation-change pushes
//!
//! Subscribing is the only connection state the server keeps. A subscriber
//! refreshes itself by sending `Subscribe` again; one that stays silent past
//! the timeout is dropped so abandoned addresses stop receiving datagrams.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Silence after which a subscriber is dropped
pub const SUBSCRIPTION_TIMEOUT: Duration = Duration::from_secs(30);

/// One address receiving `GenerationChanged` packets
#[derive(Debug)]
pub struct Subscriber {
    /// Address pushes are sent to
    pub addr: SocketAddr,
    /// Last time this address subscribed or refreshed
    pub last_seen: Instant,
}

impl Subscriber {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            last_seen: Instant::now(),
        }
    }

    /// Checks if the subscriber has gone silent for longer than `timeout`
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Outcome of a subscribe request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    Added,
    Refreshed,
    Full,
}

/// Tracks subscribers with a capacity limit
///
/// The limit bounds the fan-out work done on every tick.
pub struct SubscriberManager {
    subscribers: HashMap<SocketAddr, Subscriber>,
    max_subscribers: usize,
    timeout: Duration,
}

impl SubscriberManager {
    pub fn new(max_subscribers: usize) -> Self {
        Self::with_timeout(max_subscribers, SUBSCRIPTION_TIMEOUT)
    }

    /// Creates a manager that drops subscribers silent for longer than `timeout`
    pub fn with_timeout(max_subscribers: usize, timeout: Duration) -> Self {
        Self {
            subscribers: HashMap::new(),
            max_subscribers,
            timeout,
        }
    }

    /// Adds `addr`, or refreshes it if already subscribed
    ///
    /// Returns [`Subscription::Full`] when a new address would exceed capacity.
    pub fn subscribe(&mut self, addr: SocketAddr) -> Subscription {
        if let Some(subscriber) = self.subscribers.get_mut(&addr) {
            subscriber.last_seen = Instant::now();
            return Subscription::Refreshed;
        }

        if self.subscribers.len() >= self.max_subscribers {
            return Subscription::Full;
        }

        info!("Subscriber {} added", addr);
        self.subscribers.insert(addr, Subscriber::new(addr));
        Subscription::Added
    }

    /// Removes `addr`. Returns true if it was subscribed.
    pub fn unsubscribe(&mut self, addr: &SocketAddr) -> bool {
        if self.subscribers.remove(addr).is_some() {
            info!("Subscriber {} removed", addr);
            true
        } else {
            false
        }
    }

    /// Checks whether `addr` currently receives pushes
    pub fn contains(&self, addr: &SocketAddr) -> bool {
        self.subscribers.contains_key(addr)
    }

    /// Removes subscribers that have been silent past the timeout
    ///
    /// Returns the removed addresses.
    pub fn check_timeouts(&mut self) -> Vec<SocketAddr> {
        let timed_out: Vec<SocketAddr> = self
            .subscribers
            .values()
            .filter(|subscriber| subscriber.is_timed_out(self.timeout))
            .map(|subscriber| subscriber.addr)
            .collect();

        for addr in &timed_out {
            self.unsubscribe(addr);
        }

        timed_out
    }

    /// Every subscribed address, for broadcasting
    pub fn addrs(&self) -> Vec<SocketAddr> {
        self.subscribers.keys().copied().collect()
    }

    /// Number of subscribed addresses
    ///
    /// Never exceeds the capacity given at construction.
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_subscriber_timeout() {
        let mut subscriber = Subscriber::new(test_addr());
        assert!(!subscriber.is_timed_out(Duration::from_secs(1)));

        subscriber.last_seen = Instant::now() - Duration::from_secs(2);
        assert!(subscriber.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_manager_creation() {
        let manager = SubscriberManager::new(5);
        assert_eq!(manager.max_subscribers, 5);
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_subscribe_and_refresh() {
        let mut manager = SubscriberManager::new(2);

        assert_eq!(manager.subscribe(test_addr()), Subscription::Added);
        assert_eq!(manager.subscribe(test_addr()), Subscription::Refreshed);
        assert_eq!(manager.len(), 1);
        assert!(manager.contains(&test_addr()));
    }

    #[test]
    fn test_subscribe_max_capacity() {
        let mut manager = SubscriberManager::new(1);

        assert_eq!(manager.subscribe(test_addr()), Subscription::Added);
        assert_eq!(manager.subscribe(test_addr2()), Subscription::Full);
        assert_eq!(manager.len(), 1);

        // Existing subscribers can still refresh when full
        assert_eq!(manager.subscribe(test_addr()), Subscription::Refreshed);
    }

    #[test]
    fn test_unsubscribe() {
        let mut manager = SubscriberManager::new(2);
        manager.subscribe(test_addr());

        assert!(manager.unsubscribe(&test_addr()));
        assert!(!manager.unsubscribe(&test_addr()));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_check_timeouts() {
        let mut manager = SubscriberManager::with_timeout(3, Duration::from_secs(1));
        manager.subscribe(test_addr());
        manager.subscribe(test_addr2());

        if let Some(subscriber) = manager.subscribers.get_mut(&test_addr()) {
            subscriber.last_seen = Instant::now() - Duration::from_secs(2);
        }

        let removed = manager.check_timeouts();

        assert_eq!(removed, vec![test_addr()]);
        assert_eq!(manager.addrs(), vec![test_addr2()]);
    }
}
