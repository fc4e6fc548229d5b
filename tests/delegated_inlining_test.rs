//! End-to-end tests for inlining through the host bundler's pipeline

use kodegen_tools_inline_scripts::config::BoxError;
use kodegen_tools_inline_scripts::{
    InlineReport, InlineScriptsConfig, InlineStage, RegistryMode, ScriptInliner,
};

mod common;
use common::{MockHost, TestProject};

/// Run all build phases against the mock host
async fn build(inliner: &ScriptInliner, host: &MockHost, project: &TestProject) -> InlineReport {
    let registry = inliner.build_start(Some(host)).await;
    assert_eq!(registry.mode(), RegistryMode::Delegated);
    let bundle = host.process(&registry, project.out.path()).await;
    let registry = inliner.generate_bundle(registry, host, &bundle);
    inliner.write_bundle(registry, project.out.path()).await
}

fn host_minified(project: &TestProject) -> ScriptInliner {
    let config = InlineScriptsConfig::builder()
        .root(project.root.path())
        .minify(true)
        .build()
        .unwrap();
    ScriptInliner::new(config)
}

#[tokio::test]
async fn test_inline_body_replaced_by_minified_output() {
    let project = TestProject::new(
        "<body><script>console.log(1)\n\n   </script></body>",
        &[],
    );
    let host = MockHost::new(true);

    let report = build(&host_minified(&project), &host, &project).await;

    assert_eq!(
        project.built_html(),
        "<body><script>console.log(1)</script></body>"
    );
    assert_eq!(report.successes, 1);
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_external_files_minified_and_attributes_kept() {
    let project = TestProject::new(
        "<script id=\"a\" src=\"/a.js\"></script>\n<script src=\"/b.js\" data-x></script>",
        &[("a.js", "var   x =\n 1;"), ("b.js", "b( 2 );")],
    );
    let host = MockHost::new(true);

    build(&host_minified(&project), &host, &project).await;

    assert_eq!(
        project.built_html(),
        "<script id=\"a\">var x = 1;</script>\n<script data-x>b( 2 );</script>"
    );
    assert!(host.emitted_ids().iter().all(|id| id.starts_with('\0')));
}

#[tokio::test]
async fn test_no_emitted_artifact_or_manifest_entry_survives() {
    let project = TestProject::new(
        "<script src=\"/a.js\"></script><script>inline()</script>",
        &[("a.js", "a()")],
    );
    let host = MockHost::new(true);

    let report = build(&host_minified(&project), &host, &project).await;

    assert_eq!(report.removed_files.len(), 2);
    assert_eq!(
        project.output_files(),
        vec![".vite/manifest.json".to_string(), "index.html".to_string()]
    );

    let manifest: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(project.out.path().join(".vite/manifest.json")).unwrap(),
    )
    .unwrap();
    let keys: Vec<&String> = manifest.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["index.html"]);
}

#[tokio::test]
async fn test_shared_file_registered_once() {
    let project = TestProject::new(
        "<script src=\"/shared.js\"></script><script src=\"./shared.js\"></script>",
        &[("shared.js", "shared( )")],
    );
    let host = MockHost::new(true);

    let report = build(&host_minified(&project), &host, &project).await;

    assert_eq!(host.emitted_ids().len(), 1);
    assert_eq!(
        project.built_html(),
        "<script>shared( )</script><script>shared( )</script>"
    );
    assert_eq!(report.successes, 1);
}

#[tokio::test]
async fn test_file_deleted_before_load_leaves_tag_unchanged() {
    let html = "<script src=\"/a.js\"></script><script src=\"/b.js\"></script>";
    let project = TestProject::new(html, &[("a.js", "a()"), ("b.js", "b()")]);
    let host = MockHost::new(true);
    let inliner = host_minified(&project);

    let registry = inliner.build_start(Some(&host)).await;
    std::fs::remove_file(project.root.path().join("a.js")).unwrap();
    let bundle = host.process(&registry, project.out.path()).await;
    let registry = inliner.generate_bundle(registry, &host, &bundle);
    let report = inliner.write_bundle(registry, project.out.path()).await;

    assert_eq!(
        project.built_html(),
        "<script src=\"/a.js\"></script><script>b()</script>"
    );
    assert_eq!(report.successes, 1);
    assert_eq!(report.failures_at(InlineStage::Read).count(), 1);
    assert_eq!(report.failures_at(InlineStage::Collect).count(), 1);
    assert!(report.failures.iter().all(|f| f.identity == "file:a.js"));
    // Two failure records, one failed script out of two
    assert_eq!(report.failed_scripts(), 1);
    assert!((report.failure_rate() - 0.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_custom_minifier_applied_at_load() {
    let project = TestProject::new(
        "<script src=\"/a.js\"></script>",
        &[("a.js", "/* banner */\nrun(  1 );\n")],
    );
    let config = InlineScriptsConfig::builder()
        .root(project.root.path())
        .minify_with(|code: String| async move {
            tokio::task::yield_now().await;
            Ok::<_, BoxError>(code.replace("/* banner */", "").trim().to_string())
        })
        .build()
        .unwrap();
    let host = MockHost::new(true);

    let report = build(&ScriptInliner::new(config), &host, &project).await;

    // The host minifier stays off for units the custom function produced
    assert_eq!(project.built_html(), "<script>run(  1 );</script>");
    assert!(!report.has_failures());
}

#[tokio::test]
async fn test_failing_custom_minifier_falls_back_to_raw_content() {
    let project = TestProject::new("<script>keep  ( me )</script>", &[]);
    let config = InlineScriptsConfig::builder()
        .root(project.root.path())
        .minify_with(|_code: String| async move {
            Err::<String, BoxError>("minifier crashed".into())
        })
        .build()
        .unwrap();
    let host = MockHost::new(true);

    let report = build(&ScriptInliner::new(config), &host, &project).await;

    assert_eq!(project.built_html(), "<script>keep  ( me )</script>");
    assert_eq!(report.successes, 1);
    let failures: Vec<_> = report.failures_at(InlineStage::Minify).collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].error.contains("minifier crashed"));
    assert_eq!(report.failed_scripts(), 0);
}

#[tokio::test]
async fn test_missing_host_context_inlines_nothing() {
    let project = TestProject::new("<script src=\"/a.js\"></script>", &[("a.js", "a()")]);
    let inliner = host_minified(&project);

    let registry = inliner.build_start(None).await;
    let report = inliner.write_bundle(registry, project.out.path()).await;

    assert_eq!(project.built_html(), "<script src=\"/a.js\"></script>");
    assert_eq!(report.failures_at(InlineStage::Register).count(), 1);
}

#[tokio::test]
async fn test_emitted_file_already_gone_is_reported_not_fatal() {
    let project = TestProject::new("<script src=\"/a.js\"></script>", &[("a.js", "a( )")]);
    let host = MockHost::new(true);
    let inliner = host_minified(&project);

    let registry = inliner.build_start(Some(&host)).await;
    let bundle = host.process(&registry, project.out.path()).await;
    let registry = inliner.generate_bundle(registry, &host, &bundle);
    std::fs::remove_dir_all(project.out.path().join("assets")).unwrap();
    let report = inliner.write_bundle(registry, project.out.path()).await;

    assert_eq!(project.built_html(), "<script>a( )</script>");
    assert_eq!(report.successes, 1);
    assert!(report.removed_files.is_empty());
    let failures: Vec<_> = report.failures_at(InlineStage::Cleanup).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].identity, "file:a.js");
}
