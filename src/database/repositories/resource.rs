//! SeaORM-based resource repository
//!
//! Implements the metadata queries the resolver needs, plus the inserts used
//! to seed canonical sources.

use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::debug;

use crate::entities::{prelude::Resources, resources};
use crate::errors::{StoreError, StoreResult};
use crate::models::{LogoFormat, NewResource, ResourceMetadata, Sizing};
use crate::storage::MetadataStore;
use crate::utils::normalize_color;

const STORE: &str = "metadata store";

/// SeaORM-based repository for logo resource rows
#[derive(Clone)]
pub struct ResourceSeaOrmRepository {
    connection: Arc<DatabaseConnection>,
}

impl ResourceSeaOrmRepository {
    pub fn new(connection: Arc<DatabaseConnection>) -> Self {
        Self { connection }
    }

    /// Insert a canonical resource row
    pub async fn insert(&self, request: NewResource) -> Result<ResourceMetadata> {
        let format = request.resource_type.trim().to_ascii_lowercase();
        let is_vector = request.is_vector || format == LogoFormat::Svg.extension();

        let active_model = resources::ActiveModel {
            title: Set(request.title),
            short_name: Set(request.short_name),
            resource_name: Set(request.resource_name),
            resource_type: Set(format),
            resource_md5: Set(request.content_hash),
            resource_size_b: Set(request.size_bytes),
            last_update_time: Set(Some(chrono::Utc::now())),
            is_vector: Set(is_vector),
            is_bitmap: Set(!is_vector),
            resolution_width: Set(request.width),
            resolution_height: Set(request.height),
            used_for_edge: Set(request.used_for_edge),
            is_deleted: Set(false),
            background_color: Set(normalize_color(&request.background_color)),
            ..Default::default()
        };

        let model = active_model.insert(&*self.connection).await?;
        Ok(Self::model_to_domain(model))
    }

    /// Soft-delete a row; soft-deleted rows are invisible to every query
    pub async fn mark_deleted(&self, id: i32) -> Result<bool> {
        let Some(model) = Resources::find_by_id(id).one(&*self.connection).await? else {
            return Ok(false);
        };
        let mut active_model: resources::ActiveModel = model.into();
        active_model.is_deleted = Set(true);
        active_model.last_update_time = Set(Some(chrono::Utc::now()));
        active_model.update(&*self.connection).await?;
        Ok(true)
    }

    fn name_matches(name: &str) -> Condition {
        Condition::any()
            .add(resources::Column::ShortName.eq(name))
            .add(resources::Column::Title.eq(name))
    }

    fn live_by_name(name: &str) -> sea_orm::Select<Resources> {
        Resources::find()
            .filter(Self::name_matches(name))
            .filter(resources::Column::IsDeleted.eq(false))
            .order_by_asc(resources::Column::Id)
    }

    fn model_to_domain(model: resources::Model) -> ResourceMetadata {
        ResourceMetadata {
            id: model.id,
            title: model.title,
            short_name: model.short_name,
            resource_name: model.resource_name,
            resource_type: model.resource_type,
            content_hash: model.resource_md5,
            size_bytes: model.resource_size_b,
            is_vector: model.is_vector,
            width: model.resolution_width,
            height: model.resolution_height,
            used_for_edge: model.used_for_edge,
            background_color: model.background_color,
            updated_at: model.last_update_time,
        }
    }

    fn found(model: Option<resources::Model>, name: &str) -> StoreResult<ResourceMetadata> {
        model
            .map(Self::model_to_domain)
            .ok_or_else(|| StoreError::not_found(STORE, name))
    }
}

#[async_trait::async_trait]
impl MetadataStore for ResourceSeaOrmRepository {
    async fn find_by_name_and_format(&self, name: &str, format: LogoFormat) -> StoreResult<ResourceMetadata> {
        let model = Self::live_by_name(name)
            .filter(resources::Column::ResourceType.is_in(format.aliases().iter().copied()))
            .one(&*self.connection)
            .await
            .map_err(|e| StoreError::unavailable(STORE, e))?;
        Self::found(model, name)
    }

    async fn find_by_name_and_sizing(
        &self,
        name: &str,
        format: LogoFormat,
        sizing: Sizing,
        background: &str,
    ) -> StoreResult<ResourceMetadata> {
        let (width, height) = sizing.dimensions();
        let (width, height) = (
            i32::try_from(width).unwrap_or(i32::MAX),
            i32::try_from(height).unwrap_or(i32::MAX),
        );

        let exact = Self::live_by_name(name)
            .filter(resources::Column::ResourceType.is_in(format.aliases().iter().copied()))
            .filter(resources::Column::BackgroundColor.eq(background))
            .filter(resources::Column::ResolutionWidth.eq(width))
            .filter(resources::Column::ResolutionHeight.eq(height))
            .one(&*self.connection)
            .await
            .map_err(|e| StoreError::unavailable(STORE, e))?;
        if let Some(model) = exact {
            return Ok(Self::model_to_domain(model));
        }

        debug!(
            "No {}x{} {} bitmap for '{}', falling back to its edge source",
            width, height, format, name
        );
        let edge = Self::live_by_name(name)
            .filter(resources::Column::UsedForEdge.eq(true))
            .one(&*self.connection)
            .await
            .map_err(|e| StoreError::unavailable(STORE, e))?;
        Self::found(edge, name)
    }
}
