/*!
 * Tests for path resolution
 */

use anyhow::Result;
use std::path::PathBuf;

use subsync::app_config::PathConfig;
use subsync::catalog::{MediaKind, WantedItem};
use subsync::resolver::{PathResolver, ResolveMethod, TitleMatcher};
use crate::common;

#[test]
fn test_mapPrefix_withNestedMappings_shouldResolveUnderLongestPrefix() {
    let mut config = PathConfig::default();
    config.mappings.insert("/a".to_string(), PathBuf::from("/x"));
    config.mappings.insert("/a/b".to_string(), PathBuf::from("/y"));
    let resolver = PathResolver::new(&config);

    assert_eq!(resolver.map_prefix("/a/b/c"), Some(PathBuf::from("/y/c")));
    assert_eq!(resolver.map_prefix("/a/c"), Some(PathBuf::from("/x/c")));
    assert_eq!(resolver.map_prefix("/z/c"), None);
}

#[test]
fn test_titleMatcher_withPunctuatedTitle_shouldMatchDirectory() {
    let matcher = TitleMatcher::default();

    assert!(matcher.matches("Spider-Man: Far From Home", Some(2019), "Spider Man Far From Home (2019)"));
    assert!(matcher.matches("Spider-Man: Far From Home", None, "Spider Man Far From Home (2019)"));
}

#[test]
fn test_titleMatcher_withSequelOfDifferentYear_shouldFallBelowThreshold() {
    let matcher = TitleMatcher::default();

    let score = matcher.score("Spider-Man", Some(2002), "Spider-Man 2 (2004)");

    assert!(score < matcher.threshold());
}

#[test]
fn test_resolve_withMappedDirectory_shouldPickVideoInside() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let local_root = temp_dir.path().join("movies");
    let video = common::create_video(&local_root, "Heat (1995)", "Heat.1995.1080p", None)?;
    common::create_test_file(&local_root.join("Heat (1995)"), "Heat.nfo", "")?;

    let mut config = PathConfig::default();
    config.mappings.insert("/data/movies".to_string(), local_root.clone());
    let resolver = PathResolver::new(&config);

    let resolved = resolver
        .resolve(Some("/data/movies/Heat (1995)"), MediaKind::Movie, "Heat", Some(1995))
        .expect("should resolve");

    assert_eq!(resolved.path, video);
    assert_eq!(resolved.method, ResolveMethod::DirectMapping);
    Ok(())
}

#[test]
fn test_resolve_acrossSeveralRoots_shouldFindMatchInAnyRoot() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let first = temp_dir.path().join("disk1");
    let second = temp_dir.path().join("disk2");
    common::create_video(&first, "Alien (1979)", "Alien", None)?;
    let video = common::create_video(&second, "Spider Man Far From Home (2019)", "sm-ffh", None)?;

    let config = PathConfig {
        movie_roots: vec![first, second.clone()],
        ..PathConfig::default()
    };
    let resolver = PathResolver::new(&config);

    let resolved = resolver
        .resolve(None, MediaKind::Movie, "Spider-Man: Far From Home", Some(2019))
        .expect("should resolve");

    assert_eq!(resolved.path, video);
    match resolved.method {
        ResolveMethod::Fuzzy { directory, score } => {
            assert_eq!(directory, second.join("Spider Man Far From Home (2019)"));
            assert!(score >= 0.85);
        }
        other => panic!("expected fuzzy match, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_resolveItem_withEpisodeInSeasonFolder_shouldPickExactEpisode() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let season = temp_dir.path().join("The Wire (2002)").join("Season 01");
    common::create_test_file(&season, "The.Wire.S01E01.mkv", "")?;
    let wanted = common::create_test_file(&season, "The.Wire.S01E02.mkv", "")?;
    common::create_test_file(&season, "The.Wire.S01E03.mkv", "")?;

    let resolver = PathResolver::new(&common::library_paths(temp_dir.path()));
    let item = WantedItem::episode(12, "The Wire", 1, 2, "The Detail").with_year(2002);

    let resolved = resolver.resolve_item(&item).expect("should resolve");

    assert_eq!(resolved.path, wanted);
    Ok(())
}

#[test]
fn test_resolveItem_withNothingOnDisk_shouldBeNone() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let resolver = PathResolver::new(&common::library_paths(temp_dir.path()));

    let item = WantedItem::movie(1, "Heat").with_path("/data/movies/Heat (1995)/Heat.mkv");

    assert!(resolver.resolve_item(&item).is_none());
    Ok(())
}
