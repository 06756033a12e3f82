use launchpad::errors::LaunchpadError;
use launchpad::manifest::{VersionConstraint, normalize_name, parse_manifest};

#[test]
fn parses_reference_manifest() {
    let manifest = parse_manifest("django==4.2\ngunicorn==21.2\n").unwrap();

    assert_eq!(manifest.len(), 2);
    let django = manifest.get("Django").expect("django entry");
    assert_eq!(django.name, "django");
    assert_eq!(
        django.constraint,
        VersionConstraint::Specifier(vec!["==4.2".to_string()])
    );
    assert_eq!(django.line, 1);

    let gunicorn = manifest.get("gunicorn").expect("gunicorn entry");
    assert_eq!(gunicorn.line, 2);
    assert!(gunicorn.constraint.is_pinned());
    assert!(manifest.check_pins(true).is_ok());
}

#[test]
fn skips_comments_blank_lines_and_collects_options() {
    let text = "\
# web stack
--index-url https://pypi.org/simple

django==4.2   # LTS
-c constraints.txt
";
    let manifest = parse_manifest(text).unwrap();

    assert_eq!(manifest.len(), 1);
    assert_eq!(manifest.entries[0].line, 4);
    assert_eq!(
        manifest.options,
        vec![
            "--index-url https://pypi.org/simple".to_string(),
            "-c constraints.txt".to_string()
        ]
    );
}

#[test]
fn joins_continuation_lines() {
    let text = "django \\\n  ==4.2\nrequests==2.31.0\n";
    let manifest = parse_manifest(text).unwrap();

    let django = manifest.get("django").unwrap();
    assert_eq!(django.line, 1);
    assert_eq!(
        django.constraint,
        VersionConstraint::Specifier(vec!["==4.2".to_string()])
    );
    assert_eq!(manifest.get("requests").unwrap().line, 3);
}

#[test]
fn parses_extras_markers_ranges_and_urls() {
    let text = "\
psycopg[binary,pool]==3.1.18
whitenoise>=6.0, <7
tzdata==2024.1 ; sys_platform == \"win32\"
mylib @ https://example.com/mylib-1.0.tar.gz#egg=mylib
";
    let manifest = parse_manifest(text).unwrap();

    let psycopg = manifest.get("psycopg").unwrap();
    assert_eq!(psycopg.extras, vec!["binary".to_string(), "pool".to_string()]);
    assert!(psycopg.constraint.is_pinned());

    let whitenoise = manifest.get("whitenoise").unwrap();
    assert_eq!(
        whitenoise.constraint,
        VersionConstraint::Specifier(vec![">=6.0".to_string(), "<7".to_string()])
    );
    assert!(!whitenoise.constraint.is_pinned());

    let tzdata = manifest.get("tzdata").unwrap();
    assert_eq!(tzdata.marker.as_deref(), Some("sys_platform == \"win32\""));

    let mylib = manifest.get("mylib").unwrap();
    assert_eq!(
        mylib.constraint,
        VersionConstraint::Url("https://example.com/mylib-1.0.tar.gz#egg=mylib".to_string())
    );
    assert!(mylib.constraint.is_pinned());
}

#[test]
fn duplicate_names_are_rejected_after_normalisation() {
    let err = parse_manifest("Django_REST.framework==3.14\ndjango-rest-framework==3.15\n")
        .unwrap_err();
    match err {
        LaunchpadError::Manifest { line, message } => {
            assert_eq!(line, 2);
            assert!(message.contains("first declared on line 1"), "{message}");
        }
        other => panic!("Expected Manifest error, got: {:?}", other),
    }
    assert_eq!(normalize_name("Django_REST.framework"), "django-rest-framework");
}

#[test]
fn malformed_lines_report_their_line_number() {
    match parse_manifest("django==4.2\ngunicorn=21.2\n") {
        Err(LaunchpadError::Manifest { line, .. }) => assert_eq!(line, 2),
        other => panic!("Expected Manifest error, got: {:?}", other),
    }
    match parse_manifest("requests;\n") {
        Err(LaunchpadError::Manifest { line, .. }) => assert_eq!(line, 1),
        other => panic!("Expected Manifest error, got: {:?}", other),
    }
    match parse_manifest("mylib @\n") {
        Err(LaunchpadError::Manifest { line, .. }) => assert_eq!(line, 1),
        other => panic!("Expected Manifest error, got: {:?}", other),
    }
}

#[test]
fn unpinned_requirements_fail_only_when_pins_are_required() {
    let manifest = parse_manifest("django==4.2\ngunicorn\ncelery==5.*\n").unwrap();

    let unpinned: Vec<&str> = manifest.unpinned().map(|r| r.name.as_str()).collect();
    assert_eq!(unpinned, vec!["gunicorn", "celery"]);

    match manifest.check_pins(true) {
        Err(LaunchpadError::Manifest { line, message }) => {
            assert_eq!(line, 2);
            assert!(message.contains("gunicorn"));
        }
        other => panic!("Expected Manifest error, got: {:?}", other),
    }
    assert!(manifest.check_pins(false).is_ok());
}

#[test]
fn empty_manifest_is_valid() {
    let manifest = parse_manifest("# nothing yet\n\n").unwrap();
    assert!(manifest.is_empty());
    assert!(manifest.check_pins(true).is_ok());
}
