//! Template engine for expanding document bodies and layouts.

use std::borrow::Cow;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use minijinja::{AutoEscape, Environment, Error, ErrorKind, UndefinedBehavior};
use regex::Regex;

use crate::context::RenderContext;

/// Names of the custom block tag pair that wraps literal code.
///
/// `{% highlight ruby %}` becomes `<pre><code>` and `{% endhighlight %}`
/// becomes `</code></pre>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTags {
    /// Opening tag name
    pub open: String,
    /// Closing tag name
    pub close: String,
}

impl Default for BlockTags {
    fn default() -> Self {
        Self {
            open: "highlight".to_string(),
            close: "endhighlight".to_string(),
        }
    }
}

/// Rewrites the custom block tags before the engine sees them.
#[derive(Debug)]
struct BlockRewriter {
    open: Regex,
    close: Regex,
}

impl BlockRewriter {
    fn new(tags: &BlockTags) -> Self {
        // Tag names are escaped, so the patterns are always valid.
        let open = Regex::new(&format!(
            r"\{{%-?\s*{}(?:\s[^%]*)?%\}}",
            regex::escape(&tags.open)
        ))
        .expect("escaped block tag pattern");
        let close = Regex::new(&format!(
            r"\{{%-?\s*{}\s*-?%\}}",
            regex::escape(&tags.close)
        ))
        .expect("escaped block tag pattern");

        Self { open, close }
    }

    fn rewrite<'s>(&self, source: &'s str) -> Cow<'s, str> {
        if !self.open.is_match(source) && !self.close.is_match(source) {
            return Cow::Borrowed(source);
        }
        let opened = self.open.replace_all(source, "<pre><code>");
        let closed = self.close.replace_all(&opened, "</code></pre>");
        Cow::Owned(closed.into_owned())
    }
}

/// Template engine using minijinja.
///
/// Output is never auto-escaped, undefined variables render as empty, and
/// `{% include %}` resolves names under the site's `_includes` directory.
pub struct TemplateEngine {
    env: Environment<'static>,
    rewriter: Arc<BlockRewriter>,
}

impl TemplateEngine {
    /// Create an engine resolving includes from `includes_dir`.
    pub fn new(includes_dir: impl Into<PathBuf>, tags: &BlockTags) -> Self {
        let includes_dir = includes_dir.into();
        let rewriter = Arc::new(BlockRewriter::new(tags));

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_undefined_behavior(UndefinedBehavior::Chainable);
        env.set_keep_trailing_newline(true);

        let loader_rewriter = Arc::clone(&rewriter);
        env.set_loader(move |name| load_include(&includes_dir, &loader_rewriter, name));

        Self { env, rewriter }
    }

    /// Expand `source` against `context`. `name` identifies the template in errors.
    pub fn render(
        &self,
        name: &str,
        source: &str,
        context: &RenderContext<'_>,
    ) -> Result<String, Error> {
        let source = self.rewriter.rewrite(source);
        self.env.render_named_str(name, &source, context)
    }
}

/// Load an include, treating names that leave the includes root as missing.
fn load_include(
    root: &Path,
    rewriter: &BlockRewriter,
    name: &str,
) -> Result<Option<String>, Error> {
    let relative = Path::new(name);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return Ok(None);
    }

    match fs::read_to_string(root.join(relative)) {
        Ok(source) => Ok(Some(rewriter.rewrite(&source).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(
            Error::new(ErrorKind::InvalidOperation, format!("could not read include {name}"))
                .with_source(e),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facets::Facets;
    use crate::site::SiteContext;
    use pretty_assertions::assert_eq;
    use quire_content::Frontmatter;
    use serde_yaml::{Mapping, Value};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn site(config: &str) -> SiteContext {
        SiteContext {
            root: PathBuf::from("."),
            config: serde_yaml::from_str(config).unwrap(),
            data: BTreeMap::new(),
        }
    }

    fn page(yaml: &str) -> Frontmatter {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn renders_page_and_site_variables() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let site = site("title: My Site");
        let page = page("title: Hello\nitems: [a, b]");
        let facets = Facets::new();

        let ctx = RenderContext::new(&page, &site, &facets);
        let html = engine
            .render(
                "test.html",
                "{{ page.title }} @ {{ site.title }}:{% for i in page.items %} {{ i }}{% endfor %}",
                &ctx,
            )
            .unwrap();

        assert_eq!(html, "Hello @ My Site: a b");
    }

    #[test]
    fn does_not_escape_output() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let site = site("{}");
        let page = Mapping::new();
        let facets = Facets::new();

        let ctx = RenderContext::new(&page, &site, &facets).with_content("<p>x</p>");
        let html = engine.render("layout.html", "<main>{{ content }}</main>", &ctx).unwrap();

        assert_eq!(html, "<main><p>x</p></main>");
    }

    #[test]
    fn undefined_variables_render_empty() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let site = site("{}");
        let page = Mapping::new();
        let facets = Facets::new();

        let ctx = RenderContext::new(&page, &site, &facets);
        let html = engine
            .render("x.html", "[{{ page.missing.deeper }}]", &ctx)
            .unwrap();

        assert_eq!(html, "[]");
    }

    #[test]
    fn rewrites_highlight_blocks() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let site = site("{}");
        let page = page("lang: rust");
        let facets = Facets::new();

        let ctx = RenderContext::new(&page, &site, &facets);
        let html = engine
            .render(
                "code.html",
                "{% highlight ruby %}puts {{ page.lang }}{% endhighlight %}",
                &ctx,
            )
            .unwrap();

        assert_eq!(html, "<pre><code>puts rust</code></pre>");
    }

    #[test]
    fn supports_custom_block_tags() {
        let temp = tempdir().unwrap();
        let tags = BlockTags {
            open: "code".to_string(),
            close: "endcode".to_string(),
        };
        let engine = TemplateEngine::new(temp.path(), &tags);
        let site = site("{}");
        let page = Mapping::new();
        let facets = Facets::new();

        let ctx = RenderContext::new(&page, &site, &facets);
        let html = engine.render("c.html", "{% code %}x{% endcode %}", &ctx).unwrap();

        assert_eq!(html, "<pre><code>x</code></pre>");
    }

    #[test]
    fn resolves_includes() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("footer.html"), "<footer>{{ site.title }}</footer>").unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let site = site("title: Inc");
        let page = Mapping::new();
        let facets = Facets::new();

        let ctx = RenderContext::new(&page, &site, &facets);
        let html = engine
            .render("i.html", "body {% include \"footer.html\" %}", &ctx)
            .unwrap();

        assert_eq!(html, "body <footer>Inc</footer>");
    }

    #[test]
    fn refuses_includes_outside_root() {
        let temp = tempdir().unwrap();
        let includes = temp.path().join("_includes");
        fs::create_dir_all(&includes).unwrap();
        fs::write(temp.path().join("secret.html"), "secret").unwrap();
        let engine = TemplateEngine::new(&includes, &BlockTags::default());
        let site = site("{}");
        let page = Mapping::new();
        let facets = Facets::new();

        let ctx = RenderContext::new(&page, &site, &facets);
        let result = engine.render("i.html", "{% include \"../secret.html\" %}", &ctx);

        assert!(result.is_err());
    }

    #[test]
    fn exposes_data_and_facets() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let mut site = site("title: t");
        site.data.insert(
            "nav".to_string(),
            serde_yaml::from_str::<Value>("[home, about]").unwrap(),
        );
        let page = Mapping::new();
        let mut facets = Facets::new();
        facets.tags.insert("rust".to_string(), Vec::new());

        let ctx = RenderContext::new(&page, &site, &facets);
        let html = engine
            .render(
                "d.html",
                "{{ site.data.nav | join(',') }};{% for t in site.tags %}{{ t }}{% endfor %}",
                &ctx,
            )
            .unwrap();

        assert_eq!(html, "home,about;rust");
    }

    #[test]
    fn reports_syntax_errors() {
        let temp = tempdir().unwrap();
        let engine = TemplateEngine::new(temp.path(), &BlockTags::default());
        let site = site("{}");
        let page = Mapping::new();
        let facets = Facets::new();

        let ctx = RenderContext::new(&page, &site, &facets);
        let result = engine.render("bad.md", "{% if %}", &ctx);

        assert!(result.is_err());
    }
}
