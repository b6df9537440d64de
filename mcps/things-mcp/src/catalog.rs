//! Cached area, project and tag listings
//!
//! Listings are served from a [`TtlCache`] for a few minutes. Writes that
//! change a listing go through the catalog so the matching entry is dropped
//! right away instead of waiting for expiry.

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::cache::TtlCache;
use crate::client::ThingsClient;
use crate::types::{AreaSummary, NewProject, ProjectSummary, TagSummary, ThingsError};

const AREAS: &str = "areas";
const PROJECTS: &str = "projects";
const TAGS: &str = "tags";

#[derive(Debug, Clone)]
enum Listing {
    Areas(Vec<AreaSummary>),
    Projects(Vec<ProjectSummary>),
    Tags(Vec<TagSummary>),
}

/// Listing reads and the writes that invalidate them
#[derive(Clone)]
pub struct Catalog {
    client: ThingsClient,
    listings: Arc<TtlCache<Listing>>,
}

impl Catalog {
    pub fn new(client: ThingsClient, ttl: Duration) -> Self {
        Self {
            client,
            listings: Arc::new(TtlCache::new(ttl)),
        }
    }

    pub async fn areas(&self) -> Result<Vec<AreaSummary>, ThingsError> {
        if let Some(Listing::Areas(areas)) = self.listings.get(AREAS) {
            debug!("Areas served from cache");
            return Ok(areas);
        }
        let areas = self.client.fetch_areas().await?;
        self.listings.insert(AREAS, Listing::Areas(areas.clone()));
        Ok(areas)
    }

    pub async fn projects(&self) -> Result<Vec<ProjectSummary>, ThingsError> {
        if let Some(Listing::Projects(projects)) = self.listings.get(PROJECTS) {
            debug!("Projects served from cache");
            return Ok(projects);
        }
        let projects = self.client.fetch_projects().await?;
        self.listings
            .insert(PROJECTS, Listing::Projects(projects.clone()));
        Ok(projects)
    }

    pub async fn tags(&self) -> Result<Vec<TagSummary>, ThingsError> {
        if let Some(Listing::Tags(tags)) = self.listings.get(TAGS) {
            debug!("Tags served from cache");
            return Ok(tags);
        }
        let tags = self.client.fetch_tags().await?;
        self.listings.insert(TAGS, Listing::Tags(tags.clone()));
        Ok(tags)
    }

    pub async fn create_project(&self, project: &NewProject) -> Result<String, ThingsError> {
        let id = self.client.create_project(project).await?;
        self.listings.invalidate(PROJECTS);
        Ok(id)
    }

    pub async fn cancel_project(&self, project_id: &str) -> Result<String, ThingsError> {
        let name = self.client.cancel_project(project_id).await?;
        self.listings.invalidate(PROJECTS);
        Ok(name)
    }

    pub async fn delete_project(&self, project_id: &str) -> Result<String, ThingsError> {
        let name = self.client.delete_project(project_id).await?;
        self.listings.invalidate(PROJECTS);
        Ok(name)
    }

    pub async fn create_tag(&self, name: &str, parent: Option<&str>) -> Result<TagSummary, ThingsError> {
        let tag = self.client.create_tag(name, parent).await?;
        self.listings.invalidate(TAGS);
        Ok(tag)
    }
}
