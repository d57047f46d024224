//! SeaORM metadata repository on in-memory SQLite

use logo_api::database::Database;
use logo_api::database::repositories::ResourceSeaOrmRepository;
use logo_api::models::{LogoFormat, NewResource, Sizing};
use logo_api::storage::MetadataStore;

const TITLE: &str = "Shandong University of Technology";

async fn repository() -> ResourceSeaOrmRepository {
    let database = Database::in_memory().await.unwrap();
    let repository = ResourceSeaOrmRepository::new(database.connection());
    repository
        .insert(NewResource::vector_source(TITLE, "sdut", "sdut.svg"))
        .await
        .unwrap();
    repository
}

#[tokio::test]
async fn test_find_by_short_name_or_title() {
    let repository = repository().await;

    let by_short = repository
        .find_by_name_and_format("sdut", LogoFormat::Svg)
        .await
        .unwrap();
    let by_title = repository
        .find_by_name_and_format(TITLE, LogoFormat::Svg)
        .await
        .unwrap();

    assert_eq!(by_short.id, by_title.id);
    assert!(by_short.is_vector_source());
    assert_eq!(by_short.resource_name, "sdut.svg");
}

#[tokio::test]
async fn test_jpeg_aliases() {
    let repository = repository().await;
    let mut row = NewResource::bitmap(TITLE, "sdut", "sdut.jpeg", LogoFormat::Jpeg, 64, 64);
    row.resource_type = "JPEG".to_string();
    repository.insert(row).await.unwrap();

    let found = repository
        .find_by_name_and_format("sdut", LogoFormat::Jpeg)
        .await
        .unwrap();
    assert_eq!(found.resource_type, "jpeg");
    assert!(LogoFormat::Jpeg.matches_stored(&found.resource_type));
}

#[tokio::test]
async fn test_exact_bitmap_wins_over_edge_source() {
    let repository = repository().await;
    repository
        .insert(NewResource::bitmap(TITLE, "sdut", "sdut-128.png", LogoFormat::Png, 128, 128).with_background("#fff"))
        .await
        .unwrap();

    let exact = repository
        .find_by_name_and_sizing("sdut", LogoFormat::Png, Sizing::Square(128), "FFFFFF")
        .await
        .unwrap();
    assert_eq!(exact.resource_name, "sdut-128.png");
    assert_eq!(exact.background_color, "FFFFFF");

    // a different background falls back to the vector source
    let fallback = repository
        .find_by_name_and_sizing("sdut", LogoFormat::Png, Sizing::Square(128), "")
        .await
        .unwrap();
    assert!(fallback.is_vector_source());

    let other_size = repository
        .find_by_name_and_sizing("sdut", LogoFormat::Png, Sizing::Exact { width: 128, height: 64 }, "FFFFFF")
        .await
        .unwrap();
    assert!(other_size.is_vector_source());
}

#[tokio::test]
async fn test_soft_deleted_rows_are_invisible() {
    let repository = repository().await;
    let row = repository
        .find_by_name_and_format("sdut", LogoFormat::Svg)
        .await
        .unwrap();

    assert!(repository.mark_deleted(row.id).await.unwrap());

    let err = repository
        .find_by_name_and_format("sdut", LogoFormat::Svg)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    let err = repository
        .find_by_name_and_sizing("sdut", LogoFormat::Png, Sizing::Square(64), "")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_unknown_name_is_not_found() {
    let repository = repository().await;

    let err = repository
        .find_by_name_and_sizing("nowhere", LogoFormat::Png, Sizing::Square(64), "")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!repository.mark_deleted(9999).await.unwrap());
}
