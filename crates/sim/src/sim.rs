//! The clock loop that wires drivers, router, route tables and workloads together.

use std::{cell::Cell, collections::BTreeSet, rc::Rc};

use mmu::{
    Driver, Link, MappingRequest, MappingRequestRouter, MappingResponse, Port, RequestTracker,
    RouteError, RouteMode, RouterError, SpaceId, TranslationRouteTable,
};
use thiserror::Error;

use crate::{
    config::Scenario,
    workload::{AccessTag, ChannelStats, Workload},
};

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Router(#[from] RouterError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Wiring(#[from] mmu::ConfigError),
}

/// A driver together with its own link to the router.
struct Client {
    driver: Driver,
    tracker: RequestTracker,
    server: Port<MappingResponse, MappingRequest>,
    acknowledged: Rc<Cell<u64>>,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub cycles: u64,
    /// False if the run hit the cycle cap with work left.
    pub finished: bool,
    pub acknowledged: u64,
    pub channels: Vec<ChannelStats>,
    pub spaces: Vec<(SpaceId, usize)>,
}

impl Summary {
    pub fn log(&self) {
        log::info!(
            "Ran {} cycles ({}), {} tracked requests acknowledged",
            self.cycles,
            if self.finished {
                "finished"
            } else {
                "cycle cap reached"
            },
            self.acknowledged
        );
        for (channel, stats) in self.channels.iter().enumerate() {
            log::info!(
                "Channel {}: {} issued, {} returned, {} on their issue page",
                channel,
                stats.issued,
                stats.returned,
                stats.same_page
            );
        }
        for (space, pages) in &self.spaces {
            log::info!("Address space {}: {} pages mapped", space, pages);
        }
    }
}

/// One simulated system: every driver shares a single router, and every core reaches the
/// page tables through one of at most two route tables (one per route mode).
pub struct Simulation {
    router: MappingRequestRouter,
    clients: Vec<Client>,
    tables: Vec<TranslationRouteTable<AccessTag>>,
    workloads: Vec<Workload>,
    cycle: u64,
    max_cycles: u64,
}

impl Simulation {
    pub fn new(scenario: &Scenario, max_cycles: u64) -> Result<Self, SimError> {
        let mut router = MappingRequestRouter::new(scenario.policy);

        // Spaces no active driver creates are set up empty, so their channels run on
        // identity translation.
        let driven: BTreeSet<SpaceId> = scenario
            .drivers
            .iter()
            .filter(|script| !script.noop)
            .map(|script| script.space)
            .collect();
        let undriven: BTreeSet<SpaceId> = scenario
            .channels
            .iter()
            .map(|channel| channel.space)
            .filter(|space| !driven.contains(space))
            .collect();
        for space in undriven {
            log::info!("Address space {} has no driver, creating it empty", space);
            router.handle(MappingRequest::CreateSpace(space))?;
        }

        let clients = scenario
            .drivers
            .iter()
            .enumerate()
            .map(|(index, script)| {
                let (client, server) = Link::duplex(&format!("os{}", index));
                let acknowledged = Rc::new(Cell::new(0));
                let counter = acknowledged.clone();
                let tracker = RequestTracker::with_consumer(
                    client,
                    Box::new(move |response: MappingResponse| {
                        log::debug!("Request completed: {}", response);
                        counter.set(counter.get() + 1);
                    }),
                );
                Client {
                    driver: Driver::new(script.clone()),
                    tracker,
                    server,
                    acknowledged,
                }
            })
            .collect();

        let mut respond = (Vec::new(), Vec::new());
        let mut forward = (Vec::new(), Vec::new(), Vec::new());
        let mut workloads = Vec::with_capacity(scenario.channels.len());
        for (index, config) in scenario.channels.iter().enumerate() {
            log::info!(
                "Channel {}: space {}, {:?} mode, {} accesses over {}",
                index,
                config.space,
                config.mode,
                config.count,
                config.max_address
            );
            let (core, table_end) = Link::pair(&format!("core{}", index));
            let sink = match config.mode {
                RouteMode::Respond => {
                    respond.0.push(table_end);
                    respond.1.push(config.space);
                    None
                }
                RouteMode::Forward => {
                    let (downstream, memory) = Link::pair(&format!("memory{}", index));
                    forward.0.push(table_end);
                    forward.1.push(config.space);
                    forward.2.push(downstream);
                    Some(memory)
                }
            };
            workloads.push(Workload::new(index, config.clone(), core, sink));
        }

        let mut tables = Vec::new();
        if !respond.0.is_empty() {
            tables.push(TranslationRouteTable::new(respond.0, respond.1)?);
        }
        if !forward.0.is_empty() {
            tables.push(TranslationRouteTable::forwarding(
                forward.0, forward.1, forward.2,
            )?);
        }

        Ok(Self {
            router,
            clients,
            tables,
            workloads,
            cycle: 0,
            max_cycles,
        })
    }

    /// Returns true once every driver is done and every access has been issued and returned.
    pub fn is_finished(&self) -> bool {
        self.clients
            .iter()
            .all(|client| client.driver.is_done() && client.tracker.is_idle())
            && self.workloads.iter().all(Workload::is_finished)
    }

    /// Runs one cycle.
    ///
    /// Mapping traffic goes first, so accesses issued in a cycle see every change made in
    /// it.
    pub fn step(&mut self) -> Result<bool, SimError> {
        let cycle = self.cycle;

        for client in &mut self.clients {
            client.driver.tick(&mut client.tracker);
        }
        for client in &self.clients {
            self.router.serve(&client.server)?;
        }
        for client in &mut self.clients {
            client.tracker.poll();
        }

        for workload in &mut self.workloads {
            workload.issue(cycle);
        }
        for table in &self.tables {
            table.pump(self.router.directory())?;
        }
        for workload in &mut self.workloads {
            workload.collect();
        }

        self.cycle += 1;
        Ok(self.is_finished())
    }

    /// Runs until everything is finished or the cycle cap is reached.
    pub fn run(&mut self) -> Result<Summary, SimError> {
        let mut finished = self.is_finished();
        while !finished && self.cycle < self.max_cycles {
            finished = self.step()?;
        }
        if !finished {
            log::warn!("Stopping at the cycle cap of {} with work left", self.max_cycles);
        }
        Ok(self.summary(finished))
    }

    fn summary(&self, finished: bool) -> Summary {
        let directory = self.router.directory();
        Summary {
            cycles: self.cycle,
            finished,
            acknowledged: self
                .clients
                .iter()
                .map(|client| client.acknowledged.get())
                .sum(),
            channels: self.workloads.iter().map(Workload::stats).collect(),
            spaces: directory
                .space_ids()
                .filter_map(|id| directory.space(id).ok().map(|space| (id, space.len())))
                .collect(),
        }
    }
}
