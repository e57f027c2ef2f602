//! Command-line arguments and the TOML scenario file.

use std::{collections::BTreeSet, fs, io, path::PathBuf};

use clap::Parser;
use mmu::{
    DriverScript, ErrorPolicy, HumanSize, ParseSizeError, PhysicalAddress, RouteMode, SpaceId,
    VirtualAddress,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "mmu-sim")]
#[command(about = "Cycle-driven simulator for the multi-address-space MMU model")]
pub struct Args {
    /// TOML scenario file; built-in defaults are used when absent
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Raise log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Stop after this many cycles even if work remains
    #[arg(long, default_value_t = 10_000)]
    pub max_cycles: u64,

    /// Disable every mapping driver
    #[arg(long)]
    pub noop: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid scenario: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("channel {channel}: bad max_address: {source}")]
    Size {
        channel: usize,
        #[source]
        source: ParseSizeError,
    },
    #[error("channel {channel}: {field} must be nonzero")]
    Zero { channel: usize, field: &'static str },
    #[error("channel {channel}: cacheline {cacheline} is not a power of two")]
    Cacheline { channel: usize, cacheline: u64 },
    #[error("address space {0} has more than one driver")]
    DuplicateDriver(SpaceId),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyName {
    #[default]
    Fatal,
    Reject,
}

impl From<PolicyName> for ErrorPolicy {
    fn from(name: PolicyName) -> Self {
        match name {
            PolicyName::Fatal => ErrorPolicy::Fatal,
            PolicyName::Reject => ErrorPolicy::Reject,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeName {
    #[default]
    Respond,
    Forward,
}

impl From<ModeName> for RouteMode {
    fn from(name: ModeName) -> Self {
        match name {
            ModeName::Respond => RouteMode::Respond,
            ModeName::Forward => RouteMode::Forward,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MmuSection {
    pub error_policy: PolicyName,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverSection {
    pub space: u64,
    pub preload: Vec<(u64, u64)>,
    pub map: Vec<(u64, u64)>,
    pub unmap: Vec<u64>,
    pub map_delay: u64,
    pub unmap_delay: u64,
    pub finish_delay: u64,
    pub noop: bool,
}

impl Default for DriverSection {
    fn default() -> Self {
        let script = DriverScript::default();
        let pairs = |pages: &[(VirtualAddress, PhysicalAddress)]| {
            pages
                .iter()
                .map(|(v, p)| (v.as_u64(), p.as_u64()))
                .collect()
        };
        Self {
            space: script.space.as_u64(),
            preload: pairs(&script.preload),
            map: pairs(&script.map),
            unmap: script.unmap.iter().map(|v| v.as_u64()).collect(),
            map_delay: script.map_delay,
            unmap_delay: script.unmap_delay,
            finish_delay: script.finish_delay,
            noop: script.noop,
        }
    }
}

impl From<&DriverSection> for DriverScript {
    fn from(section: &DriverSection) -> Self {
        let pages = |pairs: &[(u64, u64)]| {
            pairs
                .iter()
                .map(|&(v, p)| (VirtualAddress::new(v), PhysicalAddress::new(p)))
                .collect()
        };
        DriverScript {
            space: SpaceId::new(section.space),
            preload: pages(&section.preload),
            map: pages(&section.map),
            unmap: section.unmap.iter().copied().map(VirtualAddress::new).collect(),
            map_delay: section.map_delay,
            unmap_delay: section.unmap_delay,
            finish_delay: section.finish_delay,
            noop: section.noop,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelSection {
    pub space: u64,
    pub mode: ModeName,
    pub count: u64,
    pub max_address: String,
    pub stride: u64,
    pub cacheline: u64,
    pub start_cycle: u64,
}

impl Default for ChannelSection {
    fn default() -> Self {
        Self {
            space: 0,
            mode: ModeName::Respond,
            count: 100,
            max_address: "32KiB".into(),
            stride: 328,
            cacheline: 64,
            start_cycle: 0,
        }
    }
}

/// The scenario file as written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioFile {
    pub mmu: MmuSection,
    #[serde(rename = "driver")]
    pub drivers: Vec<DriverSection>,
    #[serde(rename = "channel")]
    pub channels: Vec<ChannelSection>,
}

impl Default for ScenarioFile {
    /// One driver running the default script and one core issuing 100 accesses over the
    /// first eight pages.
    fn default() -> Self {
        Self {
            mmu: MmuSection::default(),
            drivers: vec![DriverSection::default()],
            channels: vec![ChannelSection::default()],
        }
    }
}

/// One access channel: a core issuing strided accesses in one address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    pub space: SpaceId,
    pub mode: RouteMode,
    pub count: u64,
    pub max_address: HumanSize,
    pub stride: u64,
    pub cacheline: u64,
    pub start_cycle: u64,
}

/// A validated scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub policy: ErrorPolicy,
    pub drivers: Vec<DriverScript>,
    pub channels: Vec<ChannelConfig>,
}

impl Scenario {
    /// Loads the scenario named by `args`, or the built-in one.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                log::info!("Loading scenario from {}", path.display());
                toml::from_str(&text)?
            }
            None => ScenarioFile::default(),
        };
        let mut scenario = Self::from_file(&file)?;
        if args.noop {
            scenario.drivers.iter_mut().for_each(|driver| driver.noop = true);
        }
        Ok(scenario)
    }

    pub fn from_file(file: &ScenarioFile) -> Result<Self, ConfigError> {
        let mut spaces = BTreeSet::new();
        let mut drivers = Vec::with_capacity(file.drivers.len());
        for section in &file.drivers {
            let script = DriverScript::from(section);
            if !spaces.insert(script.space) {
                return Err(ConfigError::DuplicateDriver(script.space));
            }
            drivers.push(script);
        }

        let channels = file
            .channels
            .iter()
            .enumerate()
            .map(|(channel, section)| Self::channel(channel, section))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            policy: file.mmu.error_policy.into(),
            drivers,
            channels,
        })
    }

    fn channel(channel: usize, section: &ChannelSection) -> Result<ChannelConfig, ConfigError> {
        let max_address: HumanSize = section
            .max_address
            .parse()
            .map_err(|source| ConfigError::Size { channel, source })?;

        if max_address.bytes() == 0 {
            return Err(ConfigError::Zero {
                channel,
                field: "max_address",
            });
        }
        if section.stride == 0 {
            return Err(ConfigError::Zero {
                channel,
                field: "stride",
            });
        }
        if !section.cacheline.is_power_of_two() {
            return Err(ConfigError::Cacheline {
                channel,
                cacheline: section.cacheline,
            });
        }

        Ok(ChannelConfig {
            space: SpaceId::new(section.space),
            mode: section.mode.into(),
            count: section.count,
            max_address,
            stride: section.stride,
            cacheline: section.cacheline,
            start_cycle: section.start_cycle,
        })
    }
}
