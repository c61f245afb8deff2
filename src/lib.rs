pub mod client;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;

pub use client::{PlatformClient, QualtricsClient, RecordedCall, RecordingClient};
pub use error::{ApiCall, SurveyError, SurveyResult};
pub use logic::{
    delete_surveys_by_name, style_survey, CreationResult, CreationStage, DeleteOptions,
    DeleteReport, SurveyCreator, SurveyStyle,
};

// Export all model types
pub use model::*;
