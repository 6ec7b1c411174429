//! Navigator construction, persistence, and upstream queries.
//!
//! A [`Navigator`] is the per-region product of the whole pipeline:
//!
//! 1. unpack the reach table into aliases and a [`Network`],
//! 2. trace every outlet into a [`PathTable`](crate::data::path_table::PathTable),
//! 3. build the [`PathLocatorMap`],
//! 4. compact the table into [`CompactPaths`],
//! 5. write the five arrays with [`BinaryIndex`].
//!
//! [`NavigatorBuilder`] runs steps 1-4 (and 5 via
//! [`build_and_write`](NavigatorBuilder::build_and_write)); [`build_regions`]
//! repeats it over many regions, keeping one region's failure from stopping
//! the others.

use crate::algs::compact::{CompactPaths, compact};
use crate::algs::path_map::{PathLocator, PathLocatorMap, build_path_map};
use crate::algs::trace::{TraceOptions, TraceStats, trace};
use crate::debug_invariants::violation;
use crate::io::index::{BinaryIndex, IndexReader, IndexWriter};
use crate::io::reach_table::read_reach_table_path;
use crate::nav_error::NavError;
use crate::topology::alias::{Alias, AliasMap};
use crate::topology::network::Network;
use crate::topology::reach::{ReachId, ReachRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const REGION_PLACEHOLDER: &str = "{region}";

/// Settings for building navigators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigatorConfig {
    pub trace: TraceOptions,
    /// Directory index files are written to.
    pub output_dir: PathBuf,
    /// File name of each index; `{region}` is replaced by the region name.
    pub file_pattern: String,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            trace: TraceOptions::default(),
            output_dir: PathBuf::from("."),
            file_pattern: format!("nav_{REGION_PLACEHOLDER}.rnav"),
        }
    }
}

impl NavigatorConfig {
    /// Parse a JSON config; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, NavError> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, NavError> {
        let cfg: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), NavError> {
        self.trace.validate()?;
        if !self.file_pattern.contains(REGION_PLACEHOLDER) {
            return Err(NavError::InvalidConfig(format!(
                "file_pattern `{}` lacks {REGION_PLACEHOLDER}; regions would overwrite each other",
                self.file_pattern
            )));
        }
        Ok(())
    }

    /// Index path for `region`.
    pub fn output_path(&self, region: &str) -> PathBuf {
        self.output_dir
            .join(self.file_pattern.replace(REGION_PLACEHOLDER, region))
    }
}

/// One reach upstream of a queried reach.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UpstreamReach {
    pub reach: ReachId,
    pub alias: Alias,
    /// Travel time from the top of `reach` to the top of the queried reach.
    pub time: f32,
    /// Flow length from the top of `reach` to the top of the queried reach.
    pub length: f32,
}

/// Compacted flow paths, locator map, and alias table of one region.
#[derive(Clone, Debug, PartialEq)]
pub struct Navigator {
    region: String,
    paths: CompactPaths,
    path_map: PathLocatorMap,
    aliases: AliasMap,
    stats: Option<TraceStats>,
}

impl Navigator {
    /// Assemble a navigator, checking the parts describe the same region.
    pub fn from_parts(
        region: impl Into<String>,
        paths: CompactPaths,
        path_map: PathLocatorMap,
        aliases: AliasMap,
    ) -> Result<Self, NavError> {
        if path_map.len() != aliases.len() {
            return Err(violation(format!(
                "path map covers {} aliases, alias index has {}",
                path_map.len(),
                aliases.len()
            )));
        }
        if path_map.table_rows() != paths.rows() {
            return Err(violation(format!(
                "path map built over {} rows, paths has {}",
                path_map.table_rows(),
                paths.rows()
            )));
        }
        // every locator must point at the owning cell of its alias
        for (alias, _) in aliases.iter() {
            let owner = path_map
                .get(alias)
                .and_then(|loc| paths.alias(loc.row_start as usize, loc.column()));
            if owner != Some(alias) {
                return Err(violation(format!(
                    "locator of alias {alias} does not point at its cell"
                )));
            }
        }
        Ok(Self {
            region: region.into(),
            paths,
            path_map,
            aliases,
            stats: None,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn paths(&self) -> &CompactPaths {
        &self.paths
    }

    pub fn path_map(&self) -> &PathLocatorMap {
        &self.path_map
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Trace statistics; `None` for a navigator loaded from disk.
    pub fn stats(&self) -> Option<&TraceStats> {
        self.stats.as_ref()
    }

    /// Number of reaches in the region.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Alias and locator of `reach`, or `None` if it is not in the region.
    pub fn locate(&self, reach: ReachId) -> Option<(Alias, PathLocator)> {
        let alias = self.aliases.alias_of(reach)?;
        Some((alias, self.path_map.get(alias)?))
    }

    /// Every reach upstream of `reach`, `reach` itself first, with travel time
    /// and length relative to it. Reaches come in path-table order.
    pub fn upstream(&self, reach: ReachId) -> Option<Vec<UpstreamReach>> {
        let (alias, loc) = self.locate(reach)?;
        let col = loc.column();
        let (base_time, base_len) = self.paths.cumulative(loc.row_start as usize, col)?;

        let mut out = Vec::new();
        for r in loc.rows() {
            // the owning row enters at `col`; later rows own only cells above it
            let skip = col.saturating_sub(self.paths.paths.start(r)?);
            let (lo, hi) = self.paths.paths.span(r)?;
            for k in lo + skip..hi {
                let a = Alias::from_u32(self.paths.paths.values()[k])?;
                out.push(UpstreamReach {
                    reach: self.aliases.reach_of(a).ok()?,
                    alias: a,
                    time: self.paths.time[k] - base_time,
                    length: self.paths.length[k] - base_len,
                });
            }
        }
        debug_assert_eq!(out.first().map(|u| u.alias), Some(alias));
        Some(out)
    }

    /// Write to `path` in the binary index format.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), NavError> {
        let path = path.as_ref();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        BinaryIndex.write(BufWriter::new(File::create(path)?), self)?;
        log::info!("[{}] wrote index to {}", self.region, path.display());
        Ok(())
    }

    /// Read a navigator written by [`write`](Self::write).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NavError> {
        let path = path.as_ref();
        let nav = BinaryIndex.read(BufReader::new(File::open(path)?))?;
        log::debug!(
            "[{}] loaded {} reaches, {} paths from {}",
            nav.region,
            nav.len(),
            nav.paths.rows(),
            path.display()
        );
        Ok(nav)
    }
}

/// Runs the build pipeline for one region at a time.
#[derive(Clone, Debug, Default)]
pub struct NavigatorBuilder {
    config: NavigatorConfig,
}

impl NavigatorBuilder {
    pub fn new(config: NavigatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    /// Build the navigator for `region` from its reach table.
    ///
    /// Errors are wrapped with the region name.
    pub fn build(&self, region: &str, records: &[ReachRecord]) -> Result<Navigator, NavError> {
        self.build_inner(region, records)
            .map_err(|e| e.in_region(region))
    }

    fn build_inner(&self, region: &str, records: &[ReachRecord]) -> Result<Navigator, NavError> {
        self.config.validate()?;
        let opts = &self.config.trace;

        log::info!("[{region}] unpacking {} reaches", records.len());
        let mut net = Network::from_records(records)?;
        net.apply_branch_order(opts.branch_order);

        log::info!("[{region}] tracing upstream paths");
        let (table, stats) = trace(&net, opts)?;

        log::info!("[{region}] mapping {} paths", table.len());
        let path_map = build_path_map(&table, net.len())?;

        log::info!("[{region}] compacting arrays");
        let paths = compact(&table)?;
        drop(table);

        let mut nav = Navigator::from_parts(region, paths, path_map, net.aliases().clone())?;
        nav.stats = Some(stats);
        Ok(nav)
    }

    /// Read a CSV reach table and build from it.
    pub fn build_from_csv(
        &self,
        region: &str,
        table: impl AsRef<Path>,
    ) -> Result<Navigator, NavError> {
        let records = read_reach_table_path(table).map_err(|e| e.in_region(region))?;
        self.build(region, &records)
    }

    /// Build and write the index for `region`; returns the path written.
    pub fn build_and_write(
        &self,
        region: &str,
        records: &[ReachRecord],
    ) -> Result<PathBuf, NavError> {
        let nav = self.build(region, records)?;
        let path = self.config.output_path(region);
        nav.write(&path).map_err(|e| e.in_region(region))?;
        Ok(path)
    }
}

/// Build and write one index per region.
///
/// Each region gets its own result; a failing region is logged and skipped.
pub fn build_regions<I, S>(
    builder: &NavigatorBuilder,
    regions: I,
) -> Vec<(String, Result<PathBuf, NavError>)>
where
    I: IntoIterator<Item = (S, Vec<ReachRecord>)>,
    S: Into<String>,
{
    regions
        .into_iter()
        .map(|(region, records)| {
            let region = region.into();
            let result = builder.build_and_write(&region, &records);
            if let Err(e) = &result {
                log::warn!("region {region} failed: {}", e.root());
            }
            (region, result)
        })
        .collect()
}
