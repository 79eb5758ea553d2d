// Core data models for submissions and submitter records.

mod submission;

pub use submission::{SubmitRequest, Submission, SubmitterRecord, SYNTHETIC_ID_PREFIX};
