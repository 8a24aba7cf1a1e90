//! Backup engine for dumback
//!
//! Produces full, independent snapshot archives, seals them with checksums,
//! verifies them later and prunes the ones that fell out of the retention
//! window.
//!
//! # Architecture
//!
//! - `archive`: writes every regular file of the source directories into a
//!   zip container
//! - `checksum`: seals an archive with an `.md5` sidecar and checks it later
//! - `retention`: deletes archive pairs older than `keep_days`
//! - `snapshot`: composes the above into `run_backup` / `verify_all`
//!
//! # Destination Layout
//!
//! A flat directory of pairs sharing a timestamped base name:
//!
//! ```text
//! dumback_20251127_143022.zip
//! dumback_20251127_143022.md5   "<hex>  dumback_20251127_143022.zip"
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use dumback::backup::{retention, snapshot};
//!
//! let report = snapshot::run_backup(&dest, &sources)?;
//! println!("{} sealed as {}", report.archive.display(), report.digest);
//!
//! retention::prune(&dest, 30);
//! for (archive, status) in snapshot::verify_all(&dest).unwrap_or_default() {
//!     println!("{}: {}", archive.display(), status.is_valid());
//! }
//! ```

pub mod archive;
pub mod checksum;
pub mod naming;
pub mod retention;
pub mod snapshot;

pub use archive::ArchiveSummary;
pub use checksum::ArchiveStatus;
pub use retention::PruneReport;
pub use snapshot::SnapshotReport;
