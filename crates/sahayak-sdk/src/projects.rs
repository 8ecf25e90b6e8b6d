//! Project records as exchanged with the portal backend.

use chrono::NaiveDate;
use sahayak_core::{GeoPoint, InspectionCheckpoint, RoutePath};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Backend identifiers arrive as either strings or integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectId::Number(id) => write!(f, "{}", id),
            ProjectId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProjectRouteError {
    #[error("project {project} has no stored {which} point")]
    MissingEndpoint { project: String, which: &'static str },
    #[error("project {project} has an invalid {which} point")]
    InvalidEndpoint { project: String, which: &'static str },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectImage {
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A project as returned by `GET /projects/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub allocated_budget: Option<f64>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub contractor_id: Option<String>,
    #[serde(default)]
    pub start_point: Option<GeoPoint>,
    #[serde(default)]
    pub end_point: Option<GeoPoint>,
    #[serde(default)]
    pub images: Vec<ProjectImage>,
}

impl ProjectRecord {
    /// Stored start and end points of the project's route.
    pub fn route_endpoints(&self) -> Result<(GeoPoint, GeoPoint), ProjectRouteError> {
        let start = self.endpoint(self.start_point, "start")?;
        let end = self.endpoint(self.end_point, "end")?;
        Ok((start, end))
    }

    fn endpoint(
        &self,
        point: Option<GeoPoint>,
        which: &'static str,
    ) -> Result<GeoPoint, ProjectRouteError> {
        let project = self.id.to_string();
        let point = point.ok_or_else(|| ProjectRouteError::MissingEndpoint {
            project: project.clone(),
            which,
        })?;
        if !point.is_valid() {
            return Err(ProjectRouteError::InvalidEndpoint { project, which });
        }
        Ok(point)
    }
}

/// Body of `POST /projects/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub project_name: String,
    pub category: String,
    pub description: String,
    pub location: String,
    pub allocated_budget: f64,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub contractor_id: String,
    pub contractor_name: String,
    pub village_name: String,
    pub approved_by: String,
    pub start_point: GeoPoint,
    pub end_point: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_path: Option<RoutePath>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inspection_points: Vec<InspectionCheckpoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedProject {
    pub id: ProjectId,
}
