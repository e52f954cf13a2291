// this_file: tests/poster_pipeline.rs
//! End-to-end poster generation against pre-seeded caches.
//!
//! These tests run fully offline: the background and avatar caches are
//! seeded up front and the avatar endpoint points at an unroutable
//! address, so any accidental network fetch fails the test quickly.

use image::{Rgba, RgbaImage};
use jrys::{Error, PosterConfig, PosterRenderer};
use std::fs;
use std::path::Path;
use std::time::Duration;

const FULL_TABLE: &str = r#"{
    "0":  [{"fortuneSummary":"大吉","luckyStar":"天同","signText":"宜出行","unsignText":"忌远行"}],
    "14": [{"fortuneSummary":"吉","luckyStar":"太阳","signText":"宜会友","unsignText":"忌争执"}],
    "28": [{"fortuneSummary":"中吉","luckyStar":"武曲","signText":"宜读书","unsignText":"忌懒散"}],
    "42": [{"fortuneSummary":"小吉","luckyStar":"天机","signText":"宜早睡","unsignText":"忌熬夜"}],
    "56": [{"fortuneSummary":"平","luckyStar":"紫微","signText":"宜静坐","unsignText":"忌冲动"}],
    "70": [{"fortuneSummary":"小凶","luckyStar":"天相","signText":"宜谨慎","unsignText":"忌冒险"}],
    "84": [{"fortuneSummary":"凶","luckyStar":"七杀","signText":"宜反思","unsignText":"忌口舌"}],
    "98": [{"fortuneSummary":"大凶","luckyStar":"破军","signText":"宜休息","unsignText":"忌决断"}]
}"#;

/// Seed a complete offline data directory: fortune table, one manifest,
/// a cached 1080x1920 background, and a cached avatar for `user_id`.
fn seed_data_dir(dir: &Path, table_json: &str, user_id: &str) {
    fs::write(dir.join("jrys.json"), table_json).unwrap();

    let bg_dir = dir.join("backgroundFolder");
    fs::create_dir_all(bg_dir.join("images")).unwrap();
    fs::write(
        bg_dir.join("list.txt"),
        "http://127.0.0.1:9/photos/scene.png\n",
    )
    .unwrap();
    // Exact canvas size: inside the slack band, so the crop is a no-op.
    let background = RgbaImage::from_pixel(1080, 1920, Rgba([40, 90, 160, 255]));
    background.save(bg_dir.join("images/scene.png")).unwrap();

    let avatar_dir = dir.join("avatars");
    fs::create_dir_all(&avatar_dir).unwrap();
    let avatar = RgbaImage::from_pixel(64, 64, Rgba([200, 60, 60, 255]));
    image::DynamicImage::ImageRgba8(avatar)
        .to_rgb8()
        .save(avatar_dir.join(format!("{}.jpg", user_id)))
        .unwrap();
}

/// Offline configuration: dead avatar endpoint and a short timeout.
fn offline_config(dir: &Path) -> PosterConfig {
    let mut config = PosterConfig::new(dir);
    config.avatar_url = "http://127.0.0.1:9/avatar/{user}".to_string();
    config.fetch_timeout = Duration::from_millis(200);
    config
}

#[test]
fn generates_a_full_size_poster_from_seeded_caches() {
    let dir = tempfile::tempdir().unwrap();
    seed_data_dir(dir.path(), FULL_TABLE, "999");

    let renderer = PosterRenderer::new(offline_config(dir.path())).unwrap();
    let bytes = renderer.generate("999").unwrap();

    let poster = image::load_from_memory(&bytes).unwrap();
    assert_eq!(poster.width(), 1080);
    assert_eq!(poster.height(), 1920);
}

#[test]
fn poster_carries_the_panel_and_text_layers() {
    let dir = tempfile::tempdir().unwrap();
    seed_data_dir(dir.path(), FULL_TABLE, "999");

    let renderer = PosterRenderer::new(offline_config(dir.path())).unwrap();
    let bytes = renderer.generate("999").unwrap();
    let poster = image::load_from_memory(&bytes).unwrap().to_rgb8();

    // Top of the canvas is untouched background.
    let top = poster.get_pixel(540, 100);
    assert!(top.0[2] > top.0[0], "background should stay blue: {:?}", top);

    // The panel darkens the area behind the text block.
    let panel = poster.get_pixel(900, 1750);
    let bg = poster.get_pixel(900, 600);
    assert!(
        panel.0[2] < bg.0[2],
        "panel area {:?} should be darker than background {:?}",
        panel,
        bg
    );

    // The avatar region leans red.
    let avatar = poster.get_pixel(135, 1425);
    assert!(avatar.0[0] > avatar.0[2], "avatar area not red: {:?}", avatar);
}

#[test]
fn generate_to_temp_persists_a_jpg_for_handoff() {
    let dir = tempfile::tempdir().unwrap();
    seed_data_dir(dir.path(), FULL_TABLE, "999");

    let renderer = PosterRenderer::new(offline_config(dir.path())).unwrap();
    let path = renderer.generate_to_temp("999").unwrap();

    assert!(path.exists());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));
    let poster = image::open(&path).unwrap();
    assert_eq!(poster.width(), 1080);
    fs::remove_file(path).unwrap();
}

#[test]
fn empty_fortune_table_fails_the_request() {
    let dir = tempfile::tempdir().unwrap();
    seed_data_dir(dir.path(), "{}", "999");

    let renderer = PosterRenderer::new(offline_config(dir.path())).unwrap();
    let err = renderer.generate("999").unwrap_err();
    assert!(matches!(err, Error::NoFortuneData));
}

#[test]
fn partially_populated_table_surfaces_bucket_missing() {
    let dir = tempfile::tempdir().unwrap();
    let one_bucket =
        r#"{"0": [{"fortuneSummary":"大吉","luckyStar":"s","signText":"a","unsignText":"b"}]}"#;
    seed_data_dir(dir.path(), one_bucket, "999");

    let renderer = PosterRenderer::new(offline_config(dir.path())).unwrap();
    let mut saw_missing = false;
    for _ in 0..16 {
        match renderer.generate("999") {
            Ok(bytes) => {
                assert!(image::load_from_memory(&bytes).is_ok());
            }
            Err(Error::BucketMissing(_)) => {
                saw_missing = true;
                break;
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
    // P(16 straight hits on the single populated bucket) = 8^-16.
    assert!(saw_missing, "bucket gaps should surface as BucketMissing");
}

#[test]
fn missing_backgrounds_fail_the_request() {
    let dir = tempfile::tempdir().unwrap();
    seed_data_dir(dir.path(), FULL_TABLE, "999");
    fs::remove_file(dir.path().join("backgroundFolder/list.txt")).unwrap();

    let renderer = PosterRenderer::new(offline_config(dir.path())).unwrap();
    let err = renderer.generate("999").unwrap_err();
    assert!(matches!(err, Error::NoBackgroundsConfigured));
}

#[test]
fn unreachable_avatar_fails_the_request() {
    let dir = tempfile::tempdir().unwrap();
    seed_data_dir(dir.path(), FULL_TABLE, "999");
    fs::remove_file(dir.path().join("avatars/999.jpg")).unwrap();

    let renderer = PosterRenderer::new(offline_config(dir.path())).unwrap();
    let err = renderer.generate("999").unwrap_err();
    assert!(matches!(err, Error::FetchFailed(_)));
}

#[test]
fn undecodable_cached_avatar_degrades_to_no_avatar() {
    let dir = tempfile::tempdir().unwrap();
    seed_data_dir(dir.path(), FULL_TABLE, "999");
    fs::write(dir.path().join("avatars/999.jpg"), b"not a jpeg").unwrap();

    let renderer = PosterRenderer::new(offline_config(dir.path())).unwrap();
    // The fetch succeeds from cache; only the avatar layer is lost.
    let bytes = renderer.generate("999").unwrap();
    assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 1080);
}
