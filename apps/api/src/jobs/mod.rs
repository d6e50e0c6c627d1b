// Job state: the records polled by clients, the tracker that owns them,
// and the sweeper that evicts stale terminal jobs.

pub mod models;
pub mod sweeper;
pub mod tracker;

pub use models::{
    JobRecord, JobStatus, ParseDetails, ParseJob, ParseResult, ParseStatus, UploadDetails,
    UploadJob, UploadStatus,
};
pub use tracker::{JobTracker, TrackerError};

pub type UploadTracker = JobTracker<UploadStatus, UploadDetails>;
pub type ParseTracker = JobTracker<ParseStatus, ParseDetails>;
