use strata_config::{Error, Part, Version};

#[test]
fn test_round_trip_display() {
    for text in [
        "0.0.0",
        "1.2.3",
        "10.20.30",
        "1.2.3-beta.1",
        "1.0.0-alpha-1",
        "2.0.0-rc.1.x-y",
        "0.1.0-0",
    ] {
        let version = Version::parse(text).expect("valid version");
        assert_eq!(version.to_string(), text);
    }
}

#[test]
fn test_parse_results() {
    assert!(matches!(
        Version::parse("not-a-version"),
        Err(Error::VersionParse(ref input)) if input == "not-a-version"
    ));

    let plain = Version::parse("1.2.3").expect("valid");
    assert_eq!((plain.major(), plain.minor(), plain.patch()), (1, 2, 3));
    assert_eq!(plain.prerelease(), None);

    let pre = Version::parse("1.2.3-beta.1").expect("valid");
    assert_eq!(pre.prerelease(), Some("beta.1"));
}

#[test]
fn test_bumps() {
    let version = Version::new(1, 2, 3);
    let bump = |part| version.bump(part, None).expect("bump");
    assert_eq!(bump(Part::Minor), Version::new(1, 3, 0));
    assert_eq!(bump(Part::Major), Version::new(2, 0, 0));
    assert_eq!(bump(Part::Patch), Version::new(1, 2, 4));
}

#[test]
fn test_bump_replaces_prerelease() {
    let version = Version::parse("1.2.3-rc.1").expect("valid");
    assert_eq!(version.bump_patch(None).expect("bump").to_string(), "1.2.4");
    assert_eq!(
        version.bump_minor(Some("beta")).expect("bump").to_string(),
        "1.3.0-beta"
    );
    assert_eq!(version.bump_major(Some("")).expect("bump").to_string(), "2.0.0");
}

#[test]
fn test_ordering() {
    let parse = |s: &str| Version::parse(s).expect("valid");
    assert!(parse("1.2.3") < parse("1.2.4"));
    assert!(parse("1.2.4") < parse("1.3.0"));
    assert!(parse("1.3.0") < parse("2.0.0"));
    assert!(parse("1.2.3-alpha") < parse("1.2.3-beta"));

    let mut versions = vec![parse("2.0.0"), parse("1.3.0"), parse("1.2.3")];
    versions.sort();
    assert_eq!(versions.first(), Some(&parse("1.2.3")));
    assert_eq!(versions.iter().max(), Some(&parse("2.0.0")));
}

#[test]
fn test_equality_is_structural() {
    let rc = Version::new(1, 0, 0)
        .with_prerelease(Some("rc.1"))
        .expect("valid prerelease");
    assert_eq!(Version::parse("1.0.0-rc.1").expect("valid"), rc);
    assert_ne!(Version::new(1, 0, 0), rc);
}

#[test]
fn test_bumped_versions_stay_parseable() {
    let version = Version::new(1, 2, 3);

    let err = version
        .bump(Part::Patch, Some("a b"))
        .expect_err("invalid prerelease");
    assert!(matches!(err, Error::InvalidPrerelease(_)));

    let bumped = version.bump(Part::Patch, Some("rc.1-x")).expect("bump");
    assert_eq!(Version::parse(&bumped.to_string()).expect("reparse"), bumped);
}

#[test]
fn test_bump_past_component_maximum() {
    let version = Version::parse("18446744073709551615.0.0").expect("valid");
    let err = version.bump(Part::Major, None).expect_err("overflow");
    assert!(matches!(err, Error::VersionOverflow { part: Part::Major, .. }));
}

#[test]
fn test_serde_as_string() {
    #[derive(serde::Serialize, serde::Deserialize)]
    struct Manifest {
        version: Version,
    }

    let manifest: Manifest = toml::from_str("version = \"3.2.1-dev\"").expect("deserialize");
    assert_eq!(
        manifest.version,
        Version::new(3, 2, 1)
            .with_prerelease(Some("dev"))
            .expect("valid prerelease")
    );
    assert_eq!(
        toml::to_string(&manifest).expect("serialize").trim(),
        "version = \"3.2.1-dev\""
    );

    assert!(toml::from_str::<Manifest>("version = \"3.2\"").is_err());
}
