//! Shape checks against the rendered workflow of a fake monorepo

mod helpers;

use helpers::*;
use workflow_gen::core::{GeneratorConfig, GeneratorError};
use workflow_gen::generate;

#[test]
fn test_default_workflow_jobs_and_triggers() {
    let repo = fake_monorepo(&["core", "cli"]);
    let (_, yaml, doc) = render(&GeneratorConfig::default(), repo.path());

    assert!(yaml.starts_with("# This file is generated."));
    assert_eq!(doc["name"].as_str(), Some("CI"));
    assert_eq!(str_list(&doc["on"]["push"]["branches"]), vec!["main"]);
    assert_eq!(str_list(&doc["on"]["pull_request"]["branches"]), vec!["main"]);

    assert_eq!(
        job_ids(&doc),
        vec![
            "build",
            "publish-website",
            "test-node",
            "test-postgres",
            "test-mysql",
            "format",
            "lint"
        ]
    );
    for id in job_ids(&doc) {
        assert_eq!(job(&doc, &id)["runs-on"].as_str(), Some("ubuntu-latest"));
    }
}

#[test]
fn test_build_cache_key_covers_lockfile_and_every_package() {
    let repo = fake_monorepo(&["web", "core", "cli"]);
    let (_, _, doc) = render(&GeneratorConfig::default(), repo.path());

    let build = job(&doc, "build");
    let caches: Vec<_> = steps(build)
        .iter()
        .filter(|s| s["uses"].as_str().map_or(false, |u| u.starts_with("actions/cache@")))
        .collect();
    assert_eq!(caches.len(), 2);

    let deps_key = caches[0]["with"]["key"].as_str().unwrap();
    assert_eq!(deps_key, "${{ runner.os }}-deps-${{ hashFiles('yarn.lock') }}");

    let build_key = caches[1]["with"]["key"].as_str().unwrap();
    assert_eq!(
        build_key,
        "${{ runner.os }}-build-${{ hashFiles('yarn.lock', 'packages/cli/src/**', \
         'packages/core/src/**', 'packages/web/src/**') }}"
    );

    // Same listing, same key
    let (_, _, again) = render(&GeneratorConfig::default(), repo.path());
    let again_key = steps(job(&again, "build"))
        .iter()
        .filter_map(|s| s["with"]["key"].as_str())
        .last()
        .unwrap()
        .to_string();
    assert_eq!(again_key, build_key);
}

#[test]
fn test_lockfile_follows_package_manager() {
    let repo = fake_monorepo(&["core"]);
    let config = GeneratorConfig::from_yaml("package_manager: pnpm").unwrap();
    let (_, _, doc) = render(&config, repo.path());

    let build = job(&doc, "build");
    let cache = step_using(build, "actions/cache").unwrap();
    assert!(cache["with"]["key"]
        .as_str()
        .unwrap()
        .contains("hashFiles('pnpm-lock.yaml')"));

    let install = steps(build)
        .iter()
        .find(|s| s["name"].as_str() == Some("Install dependencies"))
        .unwrap();
    assert_eq!(install["run"].as_str(), Some("pnpm install --frozen-lockfile"));
}

#[test]
fn test_dependents_of_build_load_its_artifact() {
    let repo = fake_monorepo(&["core", "cli"]);
    let (workflow, _, doc) = render(&GeneratorConfig::default(), repo.path());

    let build = job(&doc, "build");
    let upload = step_using(build, "actions/upload-artifact").unwrap();
    assert_eq!(upload["with"]["name"].as_str(), Some("build-output"));
    assert_eq!(
        upload["with"]["path"].as_str(),
        Some("packages/cli/dist\npackages/core/dist")
    );

    let dependents = workflow.dependents_of("build");
    assert_eq!(
        dependents,
        vec!["publish-website", "test-node", "test-postgres", "test-mysql", "lint"]
    );

    for id in dependents {
        let dependent = job(&doc, id);
        assert_eq!(needs(dependent), vec!["build"]);
        let download = step_using(dependent, "actions/download-artifact")
            .unwrap_or_else(|| panic!("{} does not load the build artifact", id));
        assert_eq!(download["with"]["name"].as_str(), Some("build-output"));
        // Two packages share `packages/`, so the artifact is stored as `<name>/dist/...`
        assert_eq!(download["with"]["path"].as_str(), Some("packages"));
    }

    // Formatting runs straight from sources
    let format = job(&doc, "format");
    assert!(needs(format).is_empty());
    assert!(step_using(format, "actions/download-artifact").is_none());
}

#[test]
fn test_single_package_artifact_lands_in_its_dist() {
    let repo = fake_monorepo(&["core"]);
    let (workflow, _, doc) = render(&GeneratorConfig::default(), repo.path());

    let upload = step_using(job(&doc, "build"), "actions/upload-artifact").unwrap();
    assert_eq!(upload["with"]["path"].as_str(), Some("packages/core/dist"));

    for id in workflow.dependents_of("build") {
        let download = step_using(job(&doc, id), "actions/download-artifact").unwrap();
        assert_eq!(
            download["with"]["path"].as_str(),
            Some("packages/core/dist"),
            "{}",
            id
        );
    }
}

#[test]
fn test_matrix_axes_and_fail_fast() {
    let repo = fake_monorepo(&["core"]);
    let (workflow, _, doc) = render(&GeneratorConfig::default(), repo.path());

    let plain = job(&doc, "test-node");
    assert_eq!(plain["strategy"]["fail-fast"].as_bool(), Some(false));
    assert_eq!(str_list(&plain["strategy"]["matrix"]["node"]), vec!["18", "20", "22"]);

    let postgres = job(&doc, "test-postgres");
    assert_eq!(
        str_list(&postgres["strategy"]["matrix"]["postgres"]),
        vec!["13", "14", "15", "16"]
    );
    assert_eq!(
        postgres["env"]["POSTGRES_IMAGE_TAG"].as_str(),
        Some("${{ matrix.postgres }}")
    );

    let mysql = job(&doc, "test-mysql");
    assert_eq!(str_list(&mysql["strategy"]["matrix"]["mysql"]), vec!["5.7", "8.0"]);
    assert_eq!(mysql["env"]["MYSQL_IMAGE_TAG"].as_str(), Some("${{ matrix.mysql }}"));

    let instances = |id: &str| {
        workflow
            .job(id)
            .and_then(|j| j.strategy.as_ref())
            .map(|s| s.matrix.combinations().len())
            .unwrap()
    };
    assert_eq!(instances("test-node"), 3);
    assert_eq!(instances("test-postgres"), 12);
    assert_eq!(instances("test-mysql"), 6);
}

#[test]
fn test_fail_fast_and_test_env_pass_through() {
    let repo = fake_monorepo(&["core"]);
    let config = GeneratorConfig::from_yaml(
        r#"
fail_fast: true
test_env:
  DEBUG: "true"
runtime_versions: ["20"]
default_runtime: "20"
databases:
  - name: postgres
    env_var: POSTGRES_IMAGE_TAG
    versions: ["16"]
"#,
    )
    .unwrap();
    let (_, _, doc) = render(&config, repo.path());

    assert_eq!(job_ids(&doc).len(), 6);
    for id in ["test-node", "test-postgres"] {
        let test = job(&doc, id);
        assert_eq!(test["strategy"]["fail-fast"].as_bool(), Some(true));
        assert_eq!(test["env"]["DEBUG"].as_str(), Some("true"));
    }
    assert!(doc["jobs"]["test-mysql"].is_null());
}

#[test]
fn test_secrets_only_inside_deploy_step_env() {
    let repo = fake_monorepo(&["core", "cli"]);
    let (_, _, doc) = render(&GeneratorConfig::default(), repo.path());

    let mut strings = Vec::new();
    collect_strings(&doc, "", &mut strings);

    let with_secrets: Vec<_> = strings
        .iter()
        .filter(|(_, value)| value.contains("secrets."))
        .collect();
    assert_eq!(with_secrets.len(), 2);

    let publish = job(&doc, "publish-website");
    let deploy_index = steps(publish)
        .iter()
        .position(|s| s["id"].as_str() == Some("deploy"))
        .unwrap();
    let prefix = format!(".jobs.publish-website.steps[{}].env.", deploy_index);
    for (path, _) in with_secrets {
        assert!(path.starts_with(&prefix), "secret referenced at {}", path);
    }

    let env = &steps(publish)[deploy_index]["env"];
    assert_eq!(env["NETLIFY_SITE_ID"].as_str(), Some("${{ secrets.NETLIFY_SITE_ID }}"));
    assert_eq!(
        env["NETLIFY_AUTH_TOKEN"].as_str(),
        Some("${{ secrets.NETLIFY_AUTH_TOKEN }}")
    );
}

#[test]
fn test_secret_expressions_in_test_env_are_rejected() {
    let repo = fake_monorepo(&["core"]);
    let config = GeneratorConfig::from_yaml(
        r#"
test_env:
  TOKEN: "${{ secrets.NETLIFY_AUTH_TOKEN || 'x' }}"
  ALL: "${{ toJSON(secrets) }}"
"#,
    )
    .unwrap();

    let err = generate(&config, repo.path()).unwrap_err();
    assert!(matches!(
        err,
        GeneratorError::SecretLeak { ref job, ref location, .. }
            if job == "test-node" && location.starts_with("env.")
    ));
}

#[test]
fn test_publish_gated_on_push_to_branch() {
    let repo = fake_monorepo(&["core"]);
    let config = GeneratorConfig::from_yaml("branch: trunk").unwrap();
    let (_, _, doc) = render(&config, repo.path());

    assert_eq!(str_list(&doc["on"]["push"]["branches"]), vec!["trunk"]);
    assert_eq!(
        job(&doc, "publish-website")["if"].as_str(),
        Some("github.event_name == 'push' && github.ref == 'refs/heads/trunk'")
    );
}

#[test]
fn test_missing_packages_dir_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let err = generate(&GeneratorConfig::default(), temp.path()).unwrap_err();
    assert!(matches!(err, GeneratorError::PackagesDirMissing(_)));
}

#[test]
fn test_rendering_is_byte_stable() {
    let repo = fake_monorepo(&["b", "a"]);
    let (_, first, _) = render(&GeneratorConfig::default(), repo.path());
    let (_, second, _) = render(&GeneratorConfig::default(), repo.path());
    assert_eq!(first, second);
}
