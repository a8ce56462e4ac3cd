//! Build-configuration orchestrator: discovery, validation, lint, pipeline and chunks.

use std::collections::BTreeMap;
use std::path::Path;

use log::{info, warn};
use same_file::is_same_file;
use serde::Serialize;

use crate::chunks::{ChunkPlan, ChunkScope, ChunkSplittingPolicy, collect_asset_usage};
use crate::config::ProjectConfig;
use crate::error::{PlanError, PlanResult};
use crate::lint::{PatternLint, ScriptLint, lint_pages};
use crate::mode::{Mode, ModeProfile};
use crate::models::{
  CacheGroup, DevServer, HtmlMinify, Optimization, Plugin, ProxyRule, ResolveSection,
  RuntimeChunk, ScriptMinimizer, SplitChunks,
};
use crate::naming::OutputNaming;
use crate::pages::{PageDescriptor, discover, validate_pages};
use crate::pipeline::{MediaEntry, TransformationRule, assemble, plan_media, unrouted_templates};
use crate::project::ProjectLayout;

const SHARED_CACHE_GROUP: &str = "commons";
const INLINE_SOURCE_PATTERN: &str = r".(js|css)$";
const STYLE_MINIMIZE_PATTERN: &str = r"\.css$";

/// Complete build plan handed to the bundler engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfiguration {
  /// Selected mode.
  pub mode: Mode,
  /// Policy derived from the mode.
  pub profile: ModeProfile,
  /// Page entries, sorted by relative path.
  pub entries: Vec<PageDescriptor>,
  /// Output root and filename templates.
  pub output: OutputNaming,
  /// Module resolution settings.
  pub resolve: ResolveSection,
  /// Transformation rules in engine order.
  pub transformation_rules: Vec<TransformationRule>,
  /// Plugin invocations in engine order.
  pub plugins: Vec<Plugin>,
  /// Chunk extraction rules.
  pub chunk_policy: ChunkSplittingPolicy,
  /// Chunk assignment computed from the page imports.
  pub chunk_plan: ChunkPlan,
  /// Optimization settings.
  pub optimization: Optimization,
  /// Development server, present only when the profile asks for one.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dev_server: Option<DevServer>,
  /// Placement of every media file under the images directory.
  pub asset_manifest: Vec<MediaEntry>,
}

impl BuildConfiguration {
  /// Look up a page entry by id.
  pub fn entry(&self, id: &str) -> Option<&PageDescriptor> {
    self.entries.iter().find(|page| page.id == id)
  }

  /// Pretty JSON rendering of the configuration.
  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(self)
  }
}

/// Derives [`BuildConfiguration`]s for one project.
pub struct ConfigurationBuilder {
  config: ProjectConfig,
  layout: ProjectLayout,
}

impl ConfigurationBuilder {
  /// Create a builder for the project rooted at `project_root`.
  pub fn new(project_root: &Path, config: ProjectConfig) -> Self {
    let layout = config.to_layout(project_root);
    Self { config, layout }
  }

  /// Resolved project layout.
  pub fn layout(&self) -> &ProjectLayout {
    &self.layout
  }

  /// Lint rule set described by the project configuration.
  pub fn configured_lint(&self) -> PlanResult<PatternLint> {
    PatternLint::new(&self.config.lint_forbid)
  }

  /// Produce the configuration for `mode`.
  ///
  /// Every failure aborts the whole invocation; no partial configuration is returned.
  pub fn build<L: ScriptLint + ?Sized>(&self, mode: Mode, lint: &L) -> PlanResult<BuildConfiguration> {
    let profile = ModeProfile::for_mode(mode);
    let layout = &self.layout;
    self.ensure_distinct_output()?;

    let entries = discover(layout)?;
    validate_pages(&entries)?;
    self.check_templates()?;
    lint_pages(lint, layout, &entries)?;

    let usage = collect_asset_usage(layout, &entries);
    let chunk_policy = ChunkSplittingPolicy {
      min_sharing_count: self.config.min_sharing_count,
      min_shared_size: self.config.min_shared_size,
      extract_shared: profile.split_chunks,
      ..ChunkSplittingPolicy::default()
    };
    let chunk_plan = chunk_policy.plan_shared_chunks(&entries, &usage)?;

    let public_path = self.public_path(mode);
    let output = OutputNaming::new(&profile, layout, public_path);
    let transformation_rules = assemble(&profile, layout, public_path);
    let asset_manifest = plan_media(layout, &profile, &output)?;
    let plugins = self.plugins(&profile, &entries, &chunk_plan, &output);
    let optimization = optimization(&profile, &chunk_policy);
    let dev_server = profile.dev_server.then(|| self.dev_server());

    info!(
      "planned {} page(s) for {} with {} shared asset(s)",
      entries.len(),
      mode,
      chunk_plan.shared_chunk.assets.len()
    );

    Ok(BuildConfiguration {
      mode,
      resolve: ResolveSection {
        extensions: vec![".js".into()],
        alias: layout.aliases(),
      },
      profile,
      entries,
      output,
      transformation_rules,
      plugins,
      chunk_policy,
      chunk_plan,
      optimization,
      dev_server,
      asset_manifest,
    })
  }

  fn public_path(&self, mode: Mode) -> &str {
    match mode {
      Mode::Development => &self.config.dev_public_path,
      Mode::Production => &self.config.build_public_path,
    }
  }

  fn ensure_distinct_output(&self) -> PlanResult<()> {
    let source = &self.layout.source_root;
    let output = &self.layout.output_root;
    if source.exists() && output.exists() && is_same_file(source, output).unwrap_or(false) {
      return Err(PlanError::InvalidPolicy(format!(
        "output directory {} is the source directory",
        output.display()
      )));
    }
    Ok(())
  }

  fn check_templates(&self) -> PlanResult<()> {
    let unrouted = unrouted_templates(&self.layout);
    if self.config.strict_templates
      && let Some(path) = unrouted.first()
    {
      return Err(PlanError::UnroutedTemplate { path: path.clone() });
    }

    for path in &unrouted {
      warn!("template {} is not processed by any rule", path.display());
    }
    Ok(())
  }

  fn plugins(
    &self,
    profile: &ModeProfile,
    entries: &[PageDescriptor],
    chunk_plan: &ChunkPlan,
    output: &OutputNaming,
  ) -> Vec<Plugin> {
    let layout = &self.layout;
    let mut plugins = vec![Plugin::Define {
      definitions: BTreeMap::from([(
        "process.env.NODE_ENV".to_string(),
        format!("\"{}\"", profile.mode),
      )]),
    }];

    if profile.clean_output {
      plugins.push(Plugin::CleanOutput {
        path: layout.output_root.clone(),
      });
    }

    plugins.push(Plugin::Copy {
      from: layout.lib_root.clone(),
      to: layout.output_root.join(&layout.lib_output_dir),
    });

    for page in entries {
      let chunks = chunk_plan
        .page_chunks
        .get(&page.id)
        .map(|assignment| assignment.chunks.clone())
        .unwrap_or_else(|| vec![chunk_plan.runtime_chunk.clone(), page.id.clone()]);

      plugins.push(Plugin::HtmlPage {
        id: page.id.clone(),
        template: page.template_path.clone(),
        filename: page.output_html_path.clone(),
        chunks,
        inline_source: INLINE_SOURCE_PATTERN.into(),
        minify: profile.minify.then(HtmlMinify::full),
      });
    }

    if profile.extract_css {
      plugins.push(Plugin::ExtractCss {
        filename: output.style_filename.clone(),
        chunk_filename: output.style_filename.clone(),
      });
    }

    if profile.minify {
      plugins.push(Plugin::MinimizeCss {
        asset_pattern: STYLE_MINIMIZE_PATTERN.into(),
        discard_comments: true,
      });
    }

    plugins
  }

  fn dev_server(&self) -> DevServer {
    let config = &self.config;
    let proxy = if config.proxy_server.trim().is_empty() {
      Vec::new()
    } else {
      vec![ProxyRule {
        context: config.proxy_prefix.clone(),
        target: config.proxy_server.clone(),
        change_origin: true,
        path_rewrite: BTreeMap::from([(format!("^{}", config.proxy_prefix), "/".to_string())]),
      }]
    };

    DevServer {
      content_base: self.layout.output_root.clone(),
      open: true,
      port: config.dev_port,
      proxy,
    }
  }
}

fn optimization(profile: &ModeProfile, policy: &ChunkSplittingPolicy) -> Optimization {
  let minimizer = profile.minify.then(|| ScriptMinimizer {
    cache: true,
    parallel: true,
    drop_console: profile.drop_console_and_debugger,
    drop_debugger: profile.drop_console_and_debugger,
    pure_funcs: if profile.drop_console_and_debugger {
      vec!["console.log".into()]
    } else {
      Vec::new()
    },
  });

  let split_chunks = policy.extract_shared.then(|| SplitChunks {
    chunks: ChunkScope::All,
    cache_groups: BTreeMap::from([(
      SHARED_CACHE_GROUP.to_string(),
      CacheGroup {
        name: policy.shared_chunk_name.clone(),
        chunks: policy.scope,
        test: policy.asset_pattern.clone(),
        min_chunks: policy.min_sharing_count,
        min_size: policy.min_shared_size,
      },
    )]),
  });

  Optimization {
    used_exports: profile.tree_shaking,
    side_effects: profile.tree_shaking,
    minimizer,
    split_chunks,
    runtime_chunk: RuntimeChunk {
      name: policy.runtime_chunk_name.clone(),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lint::NoLint;
  use crate::naming::{CONTENT_HASH_LENGTH, content_hash};
  use crate::pipeline::MediaPlacement;
  use pretty_assertions::assert_eq;
  use std::fs;
  use tempfile::{TempDir, tempdir};

  fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
  }

  fn write_page(root: &Path, name: &str, script: &str) {
    let dir = root.join("src/pages").join(name);
    write_file(&dir.join("index.js"), script);
    write_file(&dir.join("index.html"), "<html><body></body></html>");
  }

  fn fixture() -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path();
    write_file(&root.join("src/styles/fragment.css"), ".card { padding: 0; }");
    write_file(&root.join("src/styles/contact.less"), "@c: red; a { color: @c; }");
    write_file(&root.join("src/lib/vendor.js"), "window.vendor = {};");
    write_file(&root.join("src/template/header.html"), "<header></header>");
    write_page(root, "home", "import '@styles/fragment.css'\nconsole.log('home')");
    write_page(root, "about", "import '@styles/fragment.css'");
    write_page(root, "contact", "import '@styles/contact.less'");
    dir
  }

  fn builder(root: &Path) -> ConfigurationBuilder {
    ConfigurationBuilder::new(root, ProjectConfig::default())
  }

  #[test]
  fn production_extracts_shared_fragment_and_runtime() {
    let dir = fixture();
    let config = builder(dir.path()).build(Mode::Production, &NoLint).unwrap();

    let ids: Vec<&str> = config.entries.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["about_index", "contact_index", "home_index"]);
    assert_eq!(config.chunk_plan.runtime_chunk, "manifest");
    assert_eq!(
      config.chunk_plan.shared_chunk.assets,
      vec!["src/styles/fragment.css".to_string()]
    );
    assert_eq!(
      config.chunk_plan.page_chunks["contact_index"].chunks,
      vec![
        "manifest".to_string(),
        "common".to_string(),
        "contact_index".to_string()
      ]
    );

    let split = config.optimization.split_chunks.as_ref().unwrap();
    assert_eq!(split.cache_groups["commons"].min_chunks, 2);
    assert!(config.optimization.minimizer.as_ref().unwrap().drop_console);
    assert!(config.dev_server.is_none());
  }

  #[test]
  fn development_extracts_only_runtime_and_configures_server() {
    let dir = fixture();
    let config_file = ProjectConfig {
      proxy_server: "http://api.example.test".into(),
      ..ProjectConfig::default()
    };
    let config = ConfigurationBuilder::new(dir.path(), config_file)
      .build(Mode::Development, &NoLint)
      .unwrap();

    assert!(config.chunk_plan.shared_chunk.assets.is_empty());
    assert_eq!(
      config.chunk_plan.page_chunks["home_index"].chunks,
      vec!["manifest".to_string(), "home_index".to_string()]
    );
    assert!(config.optimization.split_chunks.is_none());
    assert!(config.optimization.minimizer.is_none());
    assert_eq!(config.optimization.runtime_chunk.name, "manifest");

    let server = config.dev_server.as_ref().unwrap();
    assert_eq!(server.port, 8087);
    assert_eq!(server.proxy[0].context, "/proxyApi");
    assert_eq!(server.proxy[0].path_rewrite["^/proxyApi"], "/");
  }

  #[test]
  fn plugin_sequence_follows_profile() {
    let dir = fixture();
    let names = |mode: Mode| -> Vec<String> {
      let config = builder(dir.path()).build(mode, &NoLint).unwrap();
      config
        .plugins
        .iter()
        .map(|plugin| serde_json::to_value(plugin).unwrap()["plugin"].as_str().unwrap().to_string())
        .collect()
    };

    assert_eq!(
      names(Mode::Development),
      vec!["define", "copy", "html-page", "html-page", "html-page"]
    );
    assert_eq!(
      names(Mode::Production),
      vec![
        "define",
        "clean-output",
        "copy",
        "html-page",
        "html-page",
        "html-page",
        "extract-css",
        "minimize-css"
      ]
    );
  }

  #[test]
  fn lint_violation_in_one_page_aborts_everything() {
    let dir = fixture();
    let lint = PatternLint::new(["console\\.log"]).unwrap();
    let result = builder(dir.path()).build(Mode::Production, &lint);

    match result {
      Err(PlanError::Lint { page, violations }) => {
        assert_eq!(page, "home_index");
        assert_eq!(violations.len(), 1);
      }
      other => panic!("expected lint failure, got {other:?}"),
    }
  }

  #[test]
  fn lint_violation_in_imported_module_aborts_everything() {
    let dir = fixture();
    write_file(&dir.path().join("src/common/util.js"), "debugger;");
    write_page(dir.path(), "home", "import '@/common/util.js'");
    let lint = PatternLint::new(["\\bdebugger\\b"]).unwrap();

    let err = builder(dir.path()).build(Mode::Production, &lint).unwrap_err();
    match err {
      PlanError::Lint { page, violations } => {
        assert_eq!(page, "home_index");
        assert!(violations[0].contains("util.js:1:"));
      }
      other => panic!("expected lint failure, got {other:?}"),
    }
  }

  #[test]
  fn configured_lint_reads_project_patterns() {
    let dir = fixture();
    let config = ProjectConfig {
      lint_forbid: vec!["console\\.log".into()],
      ..ProjectConfig::default()
    };
    let builder = ConfigurationBuilder::new(dir.path(), config);
    let lint = builder.configured_lint().unwrap();
    assert!(builder.build(Mode::Development, &lint).is_err());
  }

  #[test]
  fn duplicate_ids_are_rejected_before_planning() {
    let dir = fixture();
    write_page(dir.path(), "a_b", "");
    write_page(dir.path(), "a/b", "");

    let err = builder(dir.path()).build(Mode::Development, &NoLint).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateId { .. }));
  }

  #[test]
  fn missing_template_is_reported_at_discovery() {
    let dir = fixture();
    write_file(&dir.path().join("src/pages/orphan/index.js"), "");

    let err = builder(dir.path()).build(Mode::Production, &NoLint).unwrap_err();
    assert!(matches!(err, PlanError::MissingTemplate { .. }));
  }

  #[test]
  fn missing_source_root_fails_discovery() {
    let dir = tempdir().unwrap();
    let err = builder(dir.path()).build(Mode::Production, &NoLint).unwrap_err();
    assert!(matches!(err, PlanError::Discovery { .. }));
  }

  #[test]
  fn unrouted_templates_are_ignored_unless_strict() {
    let dir = fixture();
    write_file(&dir.path().join("src/partials/footer.html"), "<footer></footer>");

    assert!(builder(dir.path()).build(Mode::Development, &NoLint).is_ok());

    let strict = ProjectConfig {
      strict_templates: true,
      ..ProjectConfig::default()
    };
    let err = ConfigurationBuilder::new(dir.path(), strict)
      .build(Mode::Development, &NoLint)
      .unwrap_err();
    assert!(matches!(err, PlanError::UnroutedTemplate { .. }));
  }

  #[test]
  fn output_equal_to_source_is_rejected() {
    let dir = fixture();
    let config = ProjectConfig {
      output_dir: "src".into(),
      ..ProjectConfig::default()
    };
    let err = ConfigurationBuilder::new(dir.path(), config)
      .build(Mode::Production, &NoLint)
      .unwrap_err();
    assert!(matches!(err, PlanError::InvalidPolicy(_)));
  }

  #[test]
  fn repeated_builds_are_identical() {
    let dir = fixture();
    let builder = builder(dir.path());
    let first = builder.build(Mode::Production, &NoLint).unwrap();
    let second = builder.build(Mode::Production, &NoLint).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
  }

  #[test]
  fn media_names_change_only_with_content() {
    let dir = fixture();
    let images = dir.path().join("src/images");
    fs::create_dir_all(&images).unwrap();
    fs::write(images.join("hero.png"), vec![7u8; 9000]).unwrap();
    fs::write(images.join("banner.png"), vec![9u8; 9000]).unwrap();

    let emitted = |config: &BuildConfiguration, source: &str| -> String {
      let entry = config
        .asset_manifest
        .iter()
        .find(|entry| entry.source == source)
        .unwrap();
      match &entry.placement {
        MediaPlacement::Emit { output_path } => output_path.clone(),
        other => panic!("expected emitted file, got {other:?}"),
      }
    };

    let builder = builder(dir.path());
    let first = builder.build(Mode::Production, &NoLint).unwrap();
    let again = builder.build(Mode::Production, &NoLint).unwrap();
    assert_eq!(emitted(&first, "src/images/hero.png"), emitted(&again, "src/images/hero.png"));

    let mut edited = vec![7u8; 9000];
    edited[0] = 8;
    fs::write(images.join("hero.png"), &edited).unwrap();
    let changed = builder.build(Mode::Production, &NoLint).unwrap();

    let hero = emitted(&changed, "src/images/hero.png");
    assert_ne!(emitted(&first, "src/images/hero.png"), hero);
    assert_eq!(
      hero,
      format!("assets/hero.{}.png", content_hash(&edited, CONTENT_HASH_LENGTH))
    );
    assert_eq!(
      emitted(&first, "src/images/banner.png"),
      emitted(&changed, "src/images/banner.png")
    );

    let dev = builder.build(Mode::Development, &NoLint).unwrap();
    assert_eq!(emitted(&dev, "src/images/hero.png"), "src/images/hero.png");
  }

  #[test]
  fn serialises_engine_facing_names() {
    let dir = fixture();
    let config = builder(dir.path()).build(Mode::Production, &NoLint).unwrap();
    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["mode"], "production");
    assert_eq!(json["profile"]["sourceMap"], "none");
    assert_eq!(json["output"]["filename"], "script/[name].[contenthash:5].js");
    assert_eq!(json["chunkPolicy"]["scope"], "initial");
    assert_eq!(json["resolve"]["alias"][1]["name"], "@styles");
    assert_eq!(json["plugins"][0]["definitions"]["process.env.NODE_ENV"], "\"production\"");
    assert!(config.entry("home_index").is_some());
  }
}
