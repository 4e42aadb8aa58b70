//! Static type registry for file names and extensions

use phf::{phf_map, phf_set};

/// Extension-less file names that are always text
pub static KNOWN_TEXT_NAMES: phf::Set<&'static str> = phf_set! {
    "AUTHORS",
    "CHANGELOG",
    "CHANGES",
    "CONTRIBUTING",
    "CONTRIBUTORS",
    "COPYING",
    "COPYRIGHT",
    "Dockerfile",
    "Gemfile",
    "INSTALL",
    "Jenkinsfile",
    "LICENCE",
    "LICENSE",
    "Makefile",
    "NEWS",
    "NOTICE",
    "Podfile",
    "Procfile",
    "README",
    "Rakefile",
    "THANKS",
    "TODO",
    "Vagrantfile",
    "makefile",
    "GNUmakefile",
    ".gitignore",
    ".gitattributes",
    ".gitmodules",
    ".editorconfig",
};

/// Extension (lower-case, without the dot) to media type
pub static EXTENSION_TYPES: phf::Map<&'static str, &'static str> = phf_map! {
    "txt" => "text/plain",
    "text" => "text/plain",
    "md" => "text/markdown",
    "markdown" => "text/markdown",
    "rst" => "text/x-rst",
    "adoc" => "text/asciidoc",
    "csv" => "text/csv",
    "tsv" => "text/tab-separated-values",
    "log" => "text/plain",
    "diff" => "text/x-diff",
    "patch" => "text/x-diff",
    "html" => "text/html",
    "htm" => "text/html",
    "css" => "text/css",
    "scss" => "text/x-scss",
    "less" => "text/x-less",
    "xml" => "application/xml",
    "svg" => "image/svg+xml",
    "plist" => "application/x-plist",
    "json" => "application/json",
    "yaml" => "application/yaml",
    "yml" => "application/yaml",
    "toml" => "application/toml",
    "ini" => "text/plain",
    "cfg" => "text/plain",
    "conf" => "text/plain",
    "sh" => "application/x-sh",
    "bash" => "application/x-sh",
    "zsh" => "application/x-sh",
    "fish" => "application/x-sh",
    "ps1" => "text/x-powershell",
    "rs" => "text/x-rust",
    "c" => "text/x-c",
    "h" => "text/x-c",
    "cc" => "text/x-c++",
    "cpp" => "text/x-c++",
    "cxx" => "text/x-c++",
    "hpp" => "text/x-c++",
    "m" => "text/x-objc",
    "mm" => "text/x-objc++",
    "swift" => "text/x-swift",
    "go" => "text/x-go",
    "java" => "text/x-java",
    "kt" => "text/x-kotlin",
    "scala" => "text/x-scala",
    "cs" => "text/x-csharp",
    "py" => "text/x-python",
    "rb" => "text/x-ruby",
    "pl" => "text/x-perl",
    "php" => "application/x-php",
    "lua" => "text/x-lua",
    "js" => "text/javascript",
    "mjs" => "text/javascript",
    "ts" => "text/x-typescript",
    "tsx" => "text/x-typescript",
    "jsx" => "text/javascript",
    "vue" => "text/x-vue",
    "sql" => "application/sql",
    "tex" => "text/x-tex",
    "el" => "text/x-elisp",
    "hs" => "text/x-haskell",
    "ml" => "text/x-ocaml",
    "ex" => "text/x-elixir",
    "exs" => "text/x-elixir",
    "erl" => "text/x-erlang",
    "clj" => "text/x-clojure",
    "nix" => "text/x-nix",
    "cmake" => "text/x-cmake",
    "gradle" => "text/x-groovy",
    "proto" => "text/x-protobuf",
    "png" => "image/png",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "ico" => "image/x-icon",
    "pdf" => "application/pdf",
    "zip" => "application/zip",
    "gz" => "application/gzip",
    "tar" => "application/x-tar",
    "exe" => "application/x-msdownload",
    "so" => "application/x-sharedlib",
    "dylib" => "application/x-mach-binary",
    "o" => "application/x-object",
    "a" => "application/x-archive",
    "wasm" => "application/wasm",
    "mp3" => "audio/mpeg",
    "mp4" => "video/mp4",
    "ttf" => "font/ttf",
    "woff" => "font/woff",
};

/// Non-`text/*` media types whose content is still line-oriented text
static STRUCTURED_TEXT_TYPES: phf::Set<&'static str> = phf_set! {
    "application/json",
    "application/xml",
    "application/yaml",
    "application/toml",
    "application/sql",
    "application/x-sh",
    "application/x-php",
    "application/x-plist",
    "image/svg+xml",
};

pub fn media_type(extension: &str) -> Option<&'static str> {
    EXTENSION_TYPES
        .get(extension.to_ascii_lowercase().as_str())
        .copied()
}

pub fn is_text_type(media_type: &str) -> bool {
    media_type.starts_with("text/") || STRUCTURED_TEXT_TYPES.contains(media_type)
}
