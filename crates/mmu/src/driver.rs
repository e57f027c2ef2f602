//! A scripted client that sets up and changes mappings over time.
//!
//! The driver stands in for an operating system: it creates an address space, preloads
//! some pages, and later maps and unmaps more, waiting for each batch to be acknowledged
//! before moving on.

use alloc::{vec, vec::Vec};

use crate::{MappingRequest, PageFlags, PhysicalAddress, RequestTracker, SpaceId, VirtualAddress};

/// What a [`Driver`] does, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverScript {
    /// The address space every request targets.
    pub space: SpaceId,
    /// Pages mapped untracked, together with the space creation.
    pub preload: Vec<(VirtualAddress, PhysicalAddress)>,
    /// Pages mapped as one tracked batch.
    pub map: Vec<(VirtualAddress, PhysicalAddress)>,
    /// Pages unmapped as one tracked batch.
    pub unmap: Vec<VirtualAddress>,
    /// Ticks between creating the space and sending the map batch.
    pub map_delay: u64,
    /// Ticks between the map batch completing and sending the unmap batch.
    pub unmap_delay: u64,
    /// Ticks between the unmap batch completing and the driver finishing.
    pub finish_delay: u64,
    /// Send nothing at all.
    pub noop: bool,
}

impl DriverScript {
    /// A script that never sends a request.
    pub fn noop() -> Self {
        Self {
            noop: true,
            ..Self::default()
        }
    }
}

impl Default for DriverScript {
    /// Preloads 0x4000 and 0x5000, maps 0x6000 and 0x7000, then unmaps the two preloaded
    /// pages.
    fn default() -> Self {
        let page = |v: u64, p: u64| (VirtualAddress::new(v), PhysicalAddress::new(p));
        Self {
            space: SpaceId::new(0),
            preload: vec![page(0x4000, 0xF4000), page(0x5000, 0xF5000)],
            map: vec![page(0x6000, 0xF6000), page(0x7000, 0xF7000)],
            unmap: vec![VirtualAddress::new(0x4000), VirtualAddress::new(0x5000)],
            map_delay: 5,
            unmap_delay: 60,
            finish_delay: 60,
            noop: false,
        }
    }
}

/// Where a [`Driver`] is in its script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Create,
    AwaitMapDelay,
    MapPages,
    AwaitMapAck,
    AwaitUnmapDelay,
    UnmapPages,
    AwaitUnmapAck,
    AwaitFinishDelay,
    Done,
}

/// Runs a [`DriverScript`] one tick at a time.
///
/// Each tick first counts the delay down, then does the work of the current stage. A
/// stage moves on at most once per tick.
#[derive(Debug, Clone)]
pub struct Driver {
    script: DriverScript,
    stage: Stage,
    ticks: u64,
    delay: u64,
}

impl Driver {
    pub fn new(script: DriverScript) -> Self {
        let stage = if script.noop { Stage::Done } else { Stage::Create };
        Self {
            script,
            stage,
            ticks: 0,
            delay: 0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_done(&self) -> bool {
        self.stage == Stage::Done
    }

    /// Advances the script by one tick, sending requests through `tracker`.
    ///
    /// Returns true once the script has finished. Ticking a finished driver does nothing.
    pub fn tick(&mut self, tracker: &mut RequestTracker) -> bool {
        if self.stage == Stage::Done {
            return true;
        }

        self.ticks += 1;
        self.delay = self.delay.saturating_sub(1);

        match self.stage {
            Stage::Create => {
                let space = self.script.space;
                log::info!(
                    "Creating address space {} with {} preloaded pages",
                    space,
                    self.script.preload.len()
                );
                tracker.send_untracked(MappingRequest::CreateSpace(space));
                for &(virt, phys) in &self.script.preload {
                    tracker.send_untracked(self.map_request(virt, phys));
                }
                self.wait(Stage::AwaitMapDelay, self.script.map_delay);
            }
            Stage::AwaitMapDelay => {
                if self.delay == 0 {
                    self.stage = Stage::MapPages;
                }
            }
            Stage::MapPages => {
                log::info!("Tick {}: mapping {} pages", self.ticks, self.script.map.len());
                for &(virt, phys) in &self.script.map {
                    tracker.send_tracked(self.map_request(virt, phys));
                }
                self.stage = Stage::AwaitMapAck;
            }
            Stage::AwaitMapAck => {
                if tracker.pending_count() == 0 {
                    log::info!("All page-map requests completed, continuing");
                    self.wait(Stage::AwaitUnmapDelay, self.script.unmap_delay);
                }
            }
            Stage::AwaitUnmapDelay => {
                if self.delay == 0 {
                    self.stage = Stage::UnmapPages;
                }
            }
            Stage::UnmapPages => {
                log::info!(
                    "Tick {}: unmapping {} pages",
                    self.ticks,
                    self.script.unmap.len()
                );
                for &virt in &self.script.unmap {
                    tracker.send_tracked(MappingRequest::UnmapPage {
                        space: self.script.space,
                        virt,
                        flags: PageFlags::empty(),
                    });
                }
                self.stage = Stage::AwaitUnmapAck;
            }
            Stage::AwaitUnmapAck => {
                if tracker.pending_count() == 0 {
                    log::info!("All unmap requests completed, continuing");
                    self.wait(Stage::AwaitFinishDelay, self.script.finish_delay);
                }
            }
            Stage::AwaitFinishDelay => {
                if self.delay == 0 {
                    log::info!("Driver done after {} ticks", self.ticks);
                    self.stage = Stage::Done;
                }
            }
            Stage::Done => {}
        }

        self.stage == Stage::Done
    }

    fn wait(&mut self, next: Stage, ticks: u64) {
        self.stage = next;
        self.delay = ticks;
    }

    fn map_request(&self, virt: VirtualAddress, phys: PhysicalAddress) -> MappingRequest {
        MappingRequest::MapPage {
            space: self.script.space,
            virt,
            phys,
            flags: PageFlags::empty(),
        }
    }
}
