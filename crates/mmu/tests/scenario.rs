//! Runs the whole engine the way a simulator wires it: a scripted driver talking to the
//! router through a tracker, and a core issuing accesses through a route table.

use mmu::{
    Driver, DriverScript, ErrorPolicy, Link, MappingRequest, MappingRequestRouter,
    MemoryAccessEvent, RequestTracker, SpaceId, Stage, TranslationRouteTable,
};
use proptest::prelude::*;

fn access(main: u64) -> MemoryAccessEvent {
    MemoryAccessEvent::new(main, main & !63, 8, ())
}

#[test]
fn translation_follows_mapping_changes() {
    let (client, server) = Link::duplex("os");
    let (core, table_in) = Link::pair::<MemoryAccessEvent>("core0");

    let mut router = MappingRequestRouter::new(ErrorPolicy::Fatal);
    let mut tracker = RequestTracker::new(client);
    let mut driver = Driver::new(DriverScript::default());
    let table = TranslationRouteTable::new(vec![table_in], vec![SpaceId::new(0)]).unwrap();

    let translate = |router: &MappingRequestRouter, main: u64| {
        core.send(access(main));
        assert_eq!(table.pump(router.directory()), Ok(1));
        core.recv().unwrap().main_addr
    };

    let mut before_unmap = None;
    loop {
        let done = driver.tick(&mut tracker);
        router.serve(&server).unwrap();
        tracker.poll();

        if driver.stage() == Stage::UnmapPages && before_unmap.is_none() {
            before_unmap = Some((translate(&router, 0x4008), translate(&router, 0x6008)));
        }
        if done {
            break;
        }
    }

    // Preloaded and batch-mapped pages both translate before the unmap.
    assert_eq!(before_unmap, Some((0xF4008, 0xF6008)));

    // 0x4000 and 0x5000 were unmapped and fall back to identity, the rest still translate.
    assert_eq!(translate(&router, 0x4008), 0x4008);
    assert_eq!(translate(&router, 0x5008), 0x5008);
    assert_eq!(translate(&router, 0x6008), 0xF6008);
    assert_eq!(translate(&router, 0x7FF8), 0xF7FF8);
    assert_eq!(tracker.pending_count(), 0);
}

#[test]
fn unmap_one_of_two_preloaded_pages() {
    let (client, server) = Link::duplex("os");
    let mut router = MappingRequestRouter::new(ErrorPolicy::Fatal);
    let mut tracker = RequestTracker::new(client);

    tracker.send_untracked(MappingRequest::CreateSpace(SpaceId::new(0)));
    tracker.send_untracked(MappingRequest::map(0, 0x4000, 0xF4000, 0));
    tracker.send_untracked(MappingRequest::map(0, 0x5000, 0xF5000, 0));
    tracker.send_tracked(MappingRequest::unmap(0, 0x4000, 0));
    assert_eq!(router.serve(&server), Ok(4));
    assert_eq!(tracker.poll(), 4);

    let (core, table_in) = Link::pair::<MemoryAccessEvent>("core0");
    let table = TranslationRouteTable::new(vec![table_in], vec![SpaceId::new(0)]).unwrap();
    core.send(access(0x4008));
    core.send(access(0x5008));
    assert_eq!(table.pump(router.directory()), Ok(2));
    assert_eq!(core.recv().map(|a| a.main_addr), Some(0x4008));
    assert_eq!(core.recv().map(|a| a.main_addr), Some(0xF5008));
}

#[test]
fn two_tables_share_one_directory() {
    let (client, server) = Link::duplex("os");
    let mut router = MappingRequestRouter::new(ErrorPolicy::Fatal);
    let mut tracker = RequestTracker::new(client);
    for id in [0, 1] {
        tracker.send_untracked(MappingRequest::CreateSpace(SpaceId::new(id)));
    }
    tracker.send_untracked(MappingRequest::map(1, 0x4000, 0xB4000, 0));
    router.serve(&server).unwrap();
    tracker.poll();

    let (core0, in0) = Link::pair::<MemoryAccessEvent>("core0");
    let (core1, in1) = Link::pair::<MemoryAccessEvent>("core1");
    let (out1, memory1) = Link::pair::<MemoryAccessEvent>("memory1");
    let respond = TranslationRouteTable::new(vec![in0], vec![SpaceId::new(0)]).unwrap();
    let forward =
        TranslationRouteTable::forwarding(vec![in1], vec![SpaceId::new(1)], vec![out1]).unwrap();

    core0.send(access(0x4008));
    core1.send(access(0x4008));
    respond.pump(router.directory()).unwrap();
    forward.pump(router.directory()).unwrap();

    assert_eq!(core0.recv().map(|a| a.main_addr), Some(0x4008));
    assert!(core1.recv().is_none());
    assert_eq!(memory1.recv().map(|a| a.main_addr), Some(0xB4008));
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Tracked,
    Untracked,
    Serve,
    Poll,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Tracked),
        Just(Step::Untracked),
        Just(Step::Serve),
        Just(Step::Poll),
    ]
}

proptest! {
    #[test]
    fn pending_count_tracks_unanswered_requests(steps in prop::collection::vec(step(), 0..64)) {
        let (client, server) = Link::duplex("os");
        let mut router = MappingRequestRouter::new(ErrorPolicy::Reject);
        let mut tracker = RequestTracker::new(client);
        tracker.send_untracked(MappingRequest::CreateSpace(SpaceId::new(0)));

        // Tracked requests not yet answered by the router, and answered but not yet polled.
        let mut unserved = 0usize;
        let mut unpolled = 0usize;
        let mut next_page = 0u64;
        for step in steps {
            match step {
                Step::Tracked | Step::Untracked => {
                    let v = next_page << 12;
                    next_page += 1;
                    let request = MappingRequest::map(0, v, 0x1000_0000 + v, 0);
                    if matches!(step, Step::Tracked) {
                        tracker.send_tracked(request);
                        unserved += 1;
                    } else {
                        tracker.send_untracked(request);
                    }
                }
                Step::Serve => {
                    router.serve(&server).unwrap();
                    unpolled += unserved;
                    unserved = 0;
                }
                Step::Poll => {
                    tracker.poll();
                    unpolled = 0;
                }
            }
            prop_assert_eq!(tracker.pending_count(), unserved + unpolled);
        }

        router.serve(&server).unwrap();
        tracker.poll();
        prop_assert_eq!(tracker.pending_count(), 0);
        prop_assert!(tracker.is_idle());
    }
}
