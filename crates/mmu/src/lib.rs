#![cfg_attr(not(test), no_std)]

//! # MMU model
//!
//! A software model of a multi-address-space virtual memory translation engine. It provides:
//!
//! - Independent page tables keyed by address-space id, with strict alignment and
//!   mapping-uniqueness rules.
//! - Translation of memory accesses from virtual to physical form, preserving the page and
//!   cacheline offsets, with identity fallback on a miss.
//! - A request/response protocol for creating, mapping and unmapping pages, with per-client
//!   in-flight tracking.
//! - Static routing of inbound access channels to the address space each one may use.

extern crate alloc;

mod access;
mod address;
mod address_space;
mod directory;
mod driver;
mod entry;
mod error;
mod flags;
mod human_address;
mod human_size;
mod link;
mod numbers;
mod request;
mod route_table;
mod router;
mod tracker;
mod translator;

pub use access::MemoryAccessEvent;
pub use address::{PAGE_SHIFT, PAGE_SIZE, PhysicalAddress, VirtualAddress};
pub use address_space::AddressSpace;
pub use directory::TranslationDirectory;
pub use driver::{Driver, DriverScript, Stage};
pub use entry::PageTableEntry;
pub use error::{ConfigError, MappingError, RouteError, RouterError};
pub use flags::PageFlags;
pub use human_address::HumanAddress;
pub use human_size::{HumanSize, ParseSizeError};
pub use link::{Link, Port};
pub use numbers::{PageNumber, SpaceId};
pub use request::{MappingRequest, MappingResponse, RequestKind};
pub use route_table::{RouteMode, TranslationRouteTable};
pub use router::{ErrorPolicy, MappingRequestRouter};
pub use tracker::{RequestTracker, ResponseConsumer};
pub use translator::MemoryAccessTranslator;
