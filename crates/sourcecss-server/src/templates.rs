//! Catalog page rendering.

use minijinja::{context, Environment};

use crate::catalog::{Catalog, IconPage};

/// Template engine for the sandbox page.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("index.html", INDEX_TEMPLATE)?;

        Ok(Self { env })
    }

    /// Render the catalog with one page of icons.
    pub fn render_index(
        &self,
        catalog: &Catalog,
        page: &IconPage,
        reload_script: &str,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("index.html")?;

        tmpl.render(context! {
            components => &catalog.components,
            icon_stylesheet => &catalog.icon_stylesheet,
            page => page,
            has_prev => page.index > 0,
            has_next => page.index + 1 < page.total_pages,
            reload_script => reload_script,
        })
    }
}

const INDEX_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>sourcecss sandbox</title>
  {% for component in components %}<link rel="stylesheet" href="{{ component.stylesheet }}">
  {% endfor %}{% if icon_stylesheet %}<link rel="stylesheet" href="{{ icon_stylesheet }}">
  {% endif %}<style>
    body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; }
    section { margin-bottom: 3rem; }
    .example { display: flex; align-items: center; gap: 1.5rem; margin: 1rem 0; }
    .example code { background: #f5f5f5; padding: 0.25rem 0.5rem; border-radius: 0.25rem; }
    .icons { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; }
    .icon { display: flex; align-items: center; gap: 0.5rem; }
    nav.pages { display: flex; gap: 1rem; margin-top: 1rem; }
  </style>
</head>
<body>
  <h1>sourcecss sandbox</h1>
  {% if not components and not icon_stylesheet %}
  <p>No stylesheets generated yet. Run <code>sourcecss generate</code>.</p>
  {% endif %}
  {% for component in components %}
  <section id="{{ component.name }}">
    <h2>{{ component.name }}</h2>
    <div class="example">
      <span class="{{ component.base }}">{{ component.name }}</span>
      <code>class="{{ component.base }}"</code>
    </div>
    {% for variant in component.variants %}
    <div class="example">
      <span class="{{ component.base }} {{ component.base }}--{{ variant }}">{{ variant }}</span>
      <code>class="{{ component.base }} {{ component.base }}--{{ variant }}"</code>
    </div>
    {% endfor %}
    {% for part in component.parts %}
    <div class="example">
      <span class="{{ component.base }}__{{ part }}">{{ part }}</span>
      <code>class="{{ component.base }}__{{ part }}"</code>
    </div>
    {% endfor %}
  </section>
  {% endfor %}
  {% if icon_stylesheet %}
  <section id="icons">
    <h2>icons</h2>
    <div class="icons">
      {% for icon in page.icons %}
      <div class="icon">
        <span class="src-icon--{{ icon }} src-icon--medium"></span>
        <code>src-icon--{{ icon }}</code>
      </div>
      {% endfor %}
    </div>
    <nav class="pages">
      {% if has_prev %}<a href="?page={{ page.index - 1 }}">Previous</a>{% endif %}
      <span>{{ page.first }}&ndash;{{ page.last }} of {{ page.total }}</span>
      {% if has_next %}<a href="?page={{ page.index + 1 }}">Next</a>{% endif %}
    </nav>
  </section>
  {% endif %}
  <script src="{{ reload_script }}"></script>
</body>
</html>"##;
