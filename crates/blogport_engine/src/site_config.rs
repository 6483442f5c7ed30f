use crate::blogger::BlogInfo;

/// Renders a `_config.yml` for a Minimal Mistakes Jekyll site.
pub fn render_site_config(info: &BlogInfo) -> String {
    let title = yaml_quoted(&info.title);
    let name = yaml_quoted(&info.author_name);
    let email = yaml_quoted(&info.author_email);
    let mailto = info.author_email.replace('"', "");
    format!(
        r#"# Minimal Mistakes Jekyll Theme Configuration

# Site Settings
locale                   : "en-US"
title                    : "{title}"
title_separator          : "-"
subtitle                 : "Migrated from Blogger"
name                     : "{name}"
description              : "Personal blog migrated from Blogger"
url                      : ""
baseurl                  : ""
repository               : ""
teaser                   : # path of fallback teaser image
logo                     : # path of logo image to display in the masthead
masthead_title           : # overrides the website title displayed in the masthead
breadcrumbs              : true
words_per_minute         : 200

# Site Author
author:
  name             : "{name}"
  avatar           : # path of avatar image
  bio              : "Blogger"
  location         : ""
  email            : "{email}"
  links:
    - label: "Email"
      icon: "fas fa-fw fa-envelope-square"
      url: "mailto:{mailto}"

# Site Footer
footer:
  links:
    - label: "GitHub"
      icon: "fab fa-fw fa-github"
    - label: "Twitter"
      icon: "fab fa-fw fa-twitter-square"

# Reading Files
include:
  - .htaccess
  - _pages
exclude:
  - "*.sublime-project"
  - "*.sublime-workspace"
  - vendor
  - .asset-cache
  - .bundle
  - .jekyll-assets-cache
  - .sass-cache
  - assets/js/plugins
  - assets/js/_main.js
  - assets/js/vendor
  - Capfile
  - CHANGELOG
  - config
  - Gemfile
  - Gruntfile.js
  - gulpfile.js
  - LICENSE
  - log
  - node_modules
  - package.json
  - package-lock.json
  - Rakefile
  - README
  - tmp
keep_files:
  - .git
  - .svn
encoding: "utf-8"
markdown_ext: "markdown,mkdown,mkdn,mkd,md"

# Conversion
markdown: kramdown
highlighter: rouge
lsi: false
excerpt_separator: "\n\n"
incremental: false

# Markdown Processing
kramdown:
  input: GFM
  hard_wrap: false
  auto_ids: true
  footnote_nr: 1
  entity_output: as_char
  toc_levels: 1..6
  smart_quotes: lsquo,rsquo,ldquo,rdquo
  enable_coderay: false

# Sass/SCSS
sass:
  sass_dir: _sass
  style: compressed

# Outputting
permalink: /:categories/:year/:month/:day/:title/
paginate: 10
paginate_path: /page:num/
timezone:

# Plugins
plugins:
  - jekyll-paginate
  - jekyll-sitemap
  - jekyll-gist
  - jekyll-feed
  - jekyll-include-cache

# Archives
category_archive:
  type: liquid
  path: /categories/
tag_archive:
  type: liquid
  path: /tags/

# HTML Compression
compress_html:
  clippings: all
  ignore:
    envs: development

# Defaults
defaults:
  # _posts
  - scope:
      path: ""
      type: posts
    values:
      layout: single
      author_profile: true
      read_time: true
      comments: true
      share: true
      related: true
"#
    )
}

fn yaml_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
