//! Builtin framework registry
//!
//! The table is ordered: detection walks it top to bottom and the first
//! matching entry wins, so more specific frameworks (those that wrap or
//! depend on others) must precede the frameworks they wrap. The final
//! entry is the fallback and matches unconditionally.

use crate::descriptor::{CommandSetting, FrameworkDescriptor, OutputDir};
use crate::detection::{DetectionRule, FileCheck};
use crate::routes::{immutable_asset_rule, spa_fallback, RouteRule};

/// The builtin framework table, in detection priority order.
pub fn builtin_frameworks() -> Vec<FrameworkDescriptor> {
    vec![
        FrameworkDescriptor {
            name: "Next.js".to_string(),
            slug: Some("nextjs".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("next")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("next build")
                .with_placeholder("`npm run build` or `next build`"),
            dev_command: CommandSetting::value("next dev --port $PORT"),
            output_directory: OutputDir::fixed("public"),
            default_routes: vec![],
            dependency: Some("next".to_string()),
            env_prefix: Some("NEXT_PUBLIC_".to_string()),
            cache_pattern: Some(".next/cache/**".to_string()),
        },
        FrameworkDescriptor {
            name: "Gatsby.js".to_string(),
            slug: Some("gatsby".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("gatsby")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("gatsby build")
                .with_placeholder("`npm run build` or `gatsby build`"),
            dev_command: CommandSetting::value("gatsby develop --port $PORT"),
            output_directory: OutputDir::fixed("public"),
            default_routes: vec![],
            dependency: Some("gatsby".to_string()),
            env_prefix: Some("GATSBY_".to_string()),
            cache_pattern: Some("{.cache,public}/**".to_string()),
        },
        FrameworkDescriptor {
            name: "Remix".to_string(),
            slug: Some("remix".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::exists("remix.config.js")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("remix build")
                .with_placeholder("`npm run build` or `remix build`"),
            dev_command: CommandSetting::value("remix dev"),
            output_directory: OutputDir::fixed("public"),
            default_routes: vec![],
            dependency: Some("remix".to_string()),
            env_prefix: None,
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Astro".to_string(),
            slug: Some("astro".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("astro")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("astro build")
                .with_placeholder("`npm run build` or `astro build`"),
            dev_command: CommandSetting::value("astro dev --port $PORT"),
            output_directory: OutputDir::fixed("dist"),
            default_routes: vec![
                immutable_asset_rule("^/dist/(.*)$"),
                RouteRule::filesystem(),
                RouteRule::src("/(.*)").with_dest("/index.html"),
            ],
            dependency: Some("astro".to_string()),
            env_prefix: Some("PUBLIC_".to_string()),
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Preact".to_string(),
            slug: Some("preact".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("preact-cli")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("preact build")
                .with_placeholder("`npm run build` or `preact build`"),
            dev_command: CommandSetting::value("preact watch --port $PORT"),
            output_directory: OutputDir::fixed("build"),
            default_routes: spa_fallback(),
            dependency: Some("preact-cli".to_string()),
            env_prefix: None,
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Vue.js".to_string(),
            slug: Some("vue".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("@vue/cli-service")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("vue-cli-service build")
                .with_placeholder("`npm run build` or `vue-cli-service build`"),
            dev_command: CommandSetting::value("vue-cli-service serve --port $PORT"),
            output_directory: OutputDir::fixed("dist"),
            default_routes: vec![
                RouteRule::src("^/[^/]*\\.(js|txt|ico|json)")
                    .with_header("cache-control", "max-age=300")
                    .passthrough(),
                RouteRule::src("^/(img|js|css|fonts|media)/.*")
                    .with_header("cache-control", "max-age=31536000, immutable")
                    .passthrough(),
                RouteRule::filesystem(),
                RouteRule::src("^.*").with_dest("/index.html"),
            ],
            dependency: Some("@vue/cli-service".to_string()),
            env_prefix: Some("VUE_APP_".to_string()),
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Create React App".to_string(),
            slug: Some("create-react-app".to_string()),
            detection: DetectionRule::Any(vec![
                FileCheck::npm_dependency("react-scripts"),
                FileCheck::npm_dependency("react-dev-utils"),
            ]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("react-scripts build")
                .with_placeholder("`npm run build` or `react-scripts build`"),
            dev_command: CommandSetting::value("react-scripts start"),
            output_directory: OutputDir::fixed("build"),
            default_routes: vec![
                RouteRule::src("/static/(.*)")
                    .with_header("cache-control", "s-maxage=31536000, immutable")
                    .passthrough(),
                RouteRule::src("/service-worker.js")
                    .with_header("cache-control", "s-maxage=0")
                    .passthrough(),
                RouteRule::filesystem(),
                RouteRule::src("/(.*)").with_dest("/index.html"),
            ],
            dependency: Some("react-scripts".to_string()),
            env_prefix: Some("REACT_APP_".to_string()),
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Svelte".to_string(),
            slug: Some("svelte".to_string()),
            detection: DetectionRule::Every(vec![
                FileCheck::npm_dependency("svelte"),
                FileCheck::npm_dependency("sirv-cli"),
            ]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("rollup -c")
                .with_placeholder("`npm run build` or `rollup -c`"),
            dev_command: CommandSetting::value("rollup -c -w"),
            output_directory: OutputDir::fixed("public"),
            default_routes: spa_fallback(),
            dependency: Some("sirv-cli".to_string()),
            env_prefix: None,
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Docusaurus 2".to_string(),
            slug: Some("docusaurus-2".to_string()),
            detection: DetectionRule::Any(vec![FileCheck::npm_dependency("@docusaurus/core")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("docusaurus build")
                .with_placeholder("`npm run build` or `docusaurus build`"),
            dev_command: CommandSetting::value("docusaurus start --port $PORT"),
            output_directory: OutputDir::FlattenSingleSubdir {
                base: "build".to_string(),
            },
            default_routes: vec![
                immutable_asset_rule("^/assets/(.*)$"),
                RouteRule::filesystem(),
                RouteRule::src("/(.*)").with_dest("/404.html").with_status(404),
            ],
            dependency: Some("@docusaurus/core".to_string()),
            env_prefix: None,
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Angular".to_string(),
            slug: Some("angular".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("@angular/cli")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("ng build")
                .with_placeholder("`npm run build` or `ng build`"),
            dev_command: CommandSetting::value("ng serve --port $PORT"),
            output_directory: OutputDir::FlattenSingleSubdir {
                base: "dist".to_string(),
            },
            default_routes: spa_fallback(),
            dependency: Some("@angular/cli".to_string()),
            env_prefix: None,
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Saber".to_string(),
            slug: Some("saber".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("saber")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("saber build")
                .with_placeholder("`npm run build` or `saber build`"),
            dev_command: CommandSetting::value("saber --port $PORT"),
            output_directory: OutputDir::fixed("public"),
            default_routes: vec![
                RouteRule::src("/_saber/.*")
                    .with_header("cache-control", "max-age=31536000, immutable"),
                RouteRule::filesystem(),
                RouteRule::src(".*").with_status(404).with_dest("404.html"),
            ],
            dependency: Some("saber".to_string()),
            env_prefix: None,
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Eleventy".to_string(),
            slug: Some("eleventy".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("@11ty/eleventy")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("npx @11ty/eleventy")
                .with_placeholder("`npm run build` or `npx @11ty/eleventy`"),
            dev_command: CommandSetting::value("npx @11ty/eleventy --serve --watch --port $PORT"),
            output_directory: OutputDir::fixed("_site"),
            default_routes: vec![],
            dependency: Some("@11ty/eleventy".to_string()),
            env_prefix: None,
            cache_pattern: Some(".cache/**".to_string()),
        },
        FrameworkDescriptor {
            name: "Hugo".to_string(),
            slug: Some("hugo".to_string()),
            detection: DetectionRule::Any(vec![
                FileCheck::content("config.yaml", "baseURL"),
                FileCheck::content("config.toml", "baseURL"),
                FileCheck::content("config.json", "baseURL"),
            ]),
            install_command: CommandSetting::default(),
            build_command: CommandSetting::value("hugo -D --gc")
                .with_placeholder("`hugo -D --gc`"),
            dev_command: CommandSetting::value("hugo server -D -w -p $PORT"),
            output_directory: OutputDir::ConfigKey {
                files: vec![
                    "config.json".to_string(),
                    "config.yaml".to_string(),
                    "config.toml".to_string(),
                ],
                key: "publishDir".to_string(),
                fallback: "public".to_string(),
            },
            default_routes: vec![],
            dependency: None,
            env_prefix: None,
            cache_pattern: None,
        },
        FrameworkDescriptor {
            name: "Jekyll".to_string(),
            slug: Some("jekyll".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::exists("_config.yml")]),
            install_command: CommandSetting::value("bundle install"),
            build_command: CommandSetting::value("jekyll build")
                .with_placeholder("`jekyll build`"),
            dev_command: CommandSetting::value("bundle exec jekyll serve --watch --port $PORT"),
            output_directory: OutputDir::ConfigKey {
                files: vec!["_config.yml".to_string()],
                key: "destination".to_string(),
                fallback: "_site".to_string(),
            },
            default_routes: vec![],
            dependency: None,
            env_prefix: None,
            cache_pattern: Some("{vendor/bin,vendor/cache,vendor/bundle}/**".to_string()),
        },
        FrameworkDescriptor {
            name: "Vite".to_string(),
            slug: Some("vite".to_string()),
            detection: DetectionRule::Every(vec![FileCheck::npm_dependency("vite")]),
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::value("vite build")
                .with_placeholder("`npm run build` or `vite build`"),
            dev_command: CommandSetting::value("vite --port $PORT"),
            output_directory: OutputDir::fixed("dist"),
            default_routes: vec![],
            dependency: Some("vite".to_string()),
            env_prefix: Some("VITE_".to_string()),
            cache_pattern: None,
        },
        // Fallback: matches any project. Must stay last.
        FrameworkDescriptor {
            name: "Other".to_string(),
            slug: None,
            detection: DetectionRule::Always,
            install_command: CommandSetting::placeholder("`yarn install` or `npm install`"),
            build_command: CommandSetting::placeholder("`npm run build`"),
            dev_command: CommandSetting::default(),
            output_directory: OutputDir::fixed("public"),
            default_routes: vec![],
            dependency: None,
            env_prefix: None,
            cache_pattern: None,
        },
    ]
}

/// Look up a descriptor by slug.
pub fn framework_by_slug(slug: &str) -> crate::error::Result<FrameworkDescriptor> {
    builtin_frameworks()
        .into_iter()
        .find(|d| d.slug.as_deref() == Some(slug))
        .ok_or_else(|| crate::error::FrameworkError::UnknownFramework {
            slug: slug.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::detect_framework;
    use tempfile::TempDir;

    #[test]
    fn test_fallback_is_last_and_unique() {
        let frameworks = builtin_frameworks();
        let fallbacks: Vec<_> = frameworks.iter().filter(|f| f.is_fallback()).collect();
        assert_eq!(fallbacks.len(), 1);
        assert!(frameworks.last().unwrap().is_fallback());
    }

    #[test]
    fn test_slugs_are_unique() {
        let frameworks = builtin_frameworks();
        let mut slugs: Vec<_> = frameworks.iter().filter_map(|f| f.slug.as_deref()).collect();
        let before = slugs.len();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), before);
    }

    #[test]
    fn test_empty_project_detects_fallback() {
        let temp = TempDir::new().unwrap();
        let frameworks = builtin_frameworks();
        let detected = detect_framework(temp.path(), &frameworks).unwrap();
        assert!(detected.is_fallback());
        assert_eq!(detected.name, "Other");
    }

    #[test]
    fn test_next_dependency_detects_nextjs() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{"dependencies":{"next":"^14.0.0","react":"^18.0.0"}}"#,
        )
        .unwrap();

        let frameworks = builtin_frameworks();
        let detected = detect_framework(temp.path(), &frameworks).unwrap();
        assert_eq!(detected.slug.as_deref(), Some("nextjs"));
    }

    #[test]
    fn test_remix_config_detects_remix() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("remix.config.js"), "module.exports = {};").unwrap();

        let frameworks = builtin_frameworks();
        let detected = detect_framework(temp.path(), &frameworks).unwrap();
        assert_eq!(detected.slug.as_deref(), Some("remix"));
    }

    #[test]
    fn test_jekyll_config_detects_jekyll() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("_config.yml"), "title: blog\n").unwrap();

        let frameworks = builtin_frameworks();
        let detected = detect_framework(temp.path(), &frameworks).unwrap();
        assert_eq!(detected.slug.as_deref(), Some("jekyll"));
    }

    #[test]
    fn test_hugo_requires_base_url_in_config() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.toml"), "title = \"site\"\n").unwrap();

        let frameworks = builtin_frameworks();
        let detected = detect_framework(temp.path(), &frameworks).unwrap();
        assert!(detected.is_fallback());

        std::fs::write(
            temp.path().join("config.toml"),
            "baseURL = \"https://example.com\"\n",
        )
        .unwrap();
        let detected = detect_framework(temp.path(), &frameworks).unwrap();
        assert_eq!(detected.slug.as_deref(), Some("hugo"));
    }

    #[test]
    fn test_framework_by_slug() {
        assert_eq!(framework_by_slug("saber").unwrap().name, "Saber");
        assert!(framework_by_slug("no-such-framework").is_err());
    }
}
