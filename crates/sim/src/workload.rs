//! Strided memory-access generators standing in for cores.

use mmu::{MemoryAccessEvent, PAGE_SIZE, Port};

use crate::config::ChannelConfig;

/// Identifies an access so the generator can recognize it when it comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessTag {
    pub channel: usize,
    pub seq: u64,
}

pub type Access = MemoryAccessEvent<AccessTag>;

/// Counters for one channel, reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub issued: u64,
    pub returned: u64,
    /// Accesses that came back on the page they were issued on: translation misses, and
    /// pages mapped to themselves.
    pub same_page: u64,
}

/// Issues one access per cycle on a channel, walking the address range with a fixed stride.
///
/// Translated accesses come back on the channel port in respond mode, or on the memory
/// side of the downstream link (`sink`) in forward mode.
#[derive(Debug)]
pub struct Workload {
    channel: usize,
    config: ChannelConfig,
    port: Port<Access>,
    sink: Option<Port<Access>>,
    stats: ChannelStats,
}

impl Workload {
    pub fn new(
        channel: usize,
        config: ChannelConfig,
        port: Port<Access>,
        sink: Option<Port<Access>>,
    ) -> Self {
        Self {
            channel,
            config,
            port,
            sink,
            stats: ChannelStats::default(),
        }
    }

    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    /// Returns true once every access has been issued and has come back.
    pub fn is_finished(&self) -> bool {
        self.stats.issued == self.config.count && self.stats.returned == self.stats.issued
    }

    fn address(&self, seq: u64) -> u64 {
        let offset = seq.wrapping_mul(self.config.stride) % self.config.max_address.bytes();
        offset & !7
    }

    /// Issues this cycle's access, if the channel has started and has accesses left.
    pub fn issue(&mut self, cycle: u64) {
        if cycle < self.config.start_cycle || self.stats.issued >= self.config.count {
            return;
        }

        let seq = self.stats.issued;
        let main = self.address(seq);
        let base = main & !(self.config.cacheline - 1);
        let access = MemoryAccessEvent::new(
            main,
            base,
            8,
            AccessTag {
                channel: self.channel,
                seq,
            },
        );
        log::trace!("Channel {}: issuing {}", self.channel, access);
        self.port.send(access);
        self.stats.issued += 1;
    }

    /// Takes in every translated access that has come back and returns how many there were.
    pub fn collect(&mut self) -> usize {
        let port = self.sink.as_ref().unwrap_or(&self.port);
        let mut collected = 0u64;
        while let Some(access) = port.recv() {
            debug_assert_eq!(access.payload.channel, self.channel);
            if access.main_addr / PAGE_SIZE == access.v_addr / PAGE_SIZE {
                self.stats.same_page += 1;
            }
            log::trace!(
                "Channel {}: access {} returned as {}",
                self.channel,
                access.payload.seq,
                access
            );
            collected += 1;
        }
        self.stats.returned += collected;
        collected as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mmu::{HumanSize, Link, RouteMode, SpaceId};

    fn config(count: u64, start_cycle: u64) -> ChannelConfig {
        ChannelConfig {
            space: SpaceId::new(0),
            mode: RouteMode::Respond,
            count,
            max_address: HumanSize(0x2000),
            stride: 0x830,
            cacheline: 64,
            start_cycle,
        }
    }

    #[test]
    fn strides_and_wraps_within_range() {
        let (core, table) = Link::pair("core0");
        let mut workload = Workload::new(0, config(4, 0), core, None);
        for cycle in 0..6 {
            workload.issue(cycle);
        }
        assert_eq!(workload.stats().issued, 4);

        let addresses: Vec<_> = core_drain(&table)
            .iter()
            .map(|a| (a.main_addr, a.base_addr))
            .collect();
        assert_eq!(
            addresses,
            vec![(0, 0), (0x830, 0x800), (0x1060, 0x1040), (0x1890, 0x1880)]
        );

        let (core, table) = Link::pair("core1");
        let mut workload = Workload::new(1, config(5, 0), core, None);
        for cycle in 0..5 {
            workload.issue(cycle);
        }
        // 4 * 0x830 = 0x20C0, which wraps to 0xC0.
        assert_eq!(core_drain(&table).last().map(|a| a.main_addr), Some(0xC0));
    }

    fn core_drain(port: &Port<Access>) -> Vec<Access> {
        core::iter::from_fn(|| port.recv()).collect()
    }

    #[test]
    fn waits_for_start_cycle() {
        let (core, table) = Link::pair("core0");
        let mut workload = Workload::new(0, config(1, 3), core, None);
        workload.issue(0);
        workload.issue(2);
        assert_eq!(table.pending(), 0);
        workload.issue(3);
        assert_eq!(table.pending(), 1);
    }

    #[test]
    fn counts_returned_and_same_page_accesses() {
        let (core, table) = Link::pair("core0");
        let mut workload = Workload::new(0, config(2, 0), core, None);
        workload.issue(0);
        workload.issue(1);
        assert!(!workload.is_finished());

        let mut first = table.recv().unwrap();
        first.v_addr = first.main_addr;
        table.send(first);
        let mut second = table.recv().unwrap();
        second.v_addr = second.main_addr;
        second.main_addr += 0xF_0000;
        table.send(second);

        assert_eq!(workload.collect(), 2);
        assert_eq!(
            workload.stats(),
            ChannelStats {
                issued: 2,
                returned: 2,
                same_page: 1
            }
        );
        assert!(workload.is_finished());
    }

    #[test]
    fn forward_mode_collects_from_sink() {
        let (core, _table) = Link::pair("core0");
        let (downstream, memory) = Link::pair::<Access>("memory0");
        let mut workload = Workload::new(0, config(1, 0), core, Some(memory));
        workload.issue(0);
        downstream.send(MemoryAccessEvent::new(0, 0, 8, AccessTag { channel: 0, seq: 0 }));
        assert_eq!(workload.collect(), 1);
    }
}
