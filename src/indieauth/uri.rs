//! RFC 3986 reference resolution.
//!
//! Used to turn the `href`s and `Location`s we find while discovering an
//! authorization endpoint into absolute URLs. Parsing follows the regular
//! expression from Appendix B of the RFC, so it never fails: anything that
//! does not look like a component simply comes back as absent.

use once_cell::sync::Lazy;
use regex::Regex;

static URI_COMPONENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(?:([^:/?#]+):)?(?://([^/?#]*))?([^?#]*)(?:\?([^#]*))?(?:#(.*))?$").unwrap()
});

/// A URI split into its five components.
///
/// `None` means the component was not present at all, which is different
/// from present-but-empty (`http://a/b?` has an empty query, `http://a/b`
/// has none).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    pub scheme: Option<String>,
    pub authority: Option<String>,
    pub path: String,
    pub query: Option<String>,
    pub fragment: Option<String>,
}

impl Uri {
    pub fn parse(input: &str) -> Self {
        let Some(caps) = URI_COMPONENTS.captures(input) else {
            return Self::default();
        };
        let part = |i: usize| caps.get(i).map(|m| m.as_str().to_string());
        Self {
            scheme: part(1),
            authority: part(2),
            path: part(3).unwrap_or_default(),
            query: part(4),
            fragment: part(5),
        }
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(scheme) = &self.scheme {
            write!(f, "{}:", scheme)?;
        }
        if let Some(authority) = &self.authority {
            write!(f, "//{}", authority)?;
        }
        f.write_str(&self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{}", query)?;
        }
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", fragment)?;
        }
        Ok(())
    }
}

/// Resolve `reference` against `base` (RFC 3986 §5.2.2).
pub fn resolve(base: &str, reference: &str) -> String {
    let mut base = Uri::parse(base);
    if base.path.is_empty() {
        base.path = "/".to_string();
    }
    let reference = Uri::parse(reference);

    let target = if reference.scheme.is_some() {
        Uri {
            path: remove_dot_segments(&reference.path),
            ..reference
        }
    } else if reference.authority.is_some() {
        Uri {
            scheme: base.scheme,
            authority: reference.authority,
            path: remove_dot_segments(&reference.path),
            query: reference.query,
            fragment: reference.fragment,
        }
    } else if reference.path.is_empty() {
        Uri {
            scheme: base.scheme,
            authority: base.authority,
            path: base.path,
            query: reference.query.or(base.query),
            fragment: reference.fragment,
        }
    } else {
        let path = if reference.path.starts_with('/') {
            remove_dot_segments(&reference.path)
        } else {
            remove_dot_segments(&merge(&base, &reference.path))
        };
        Uri {
            scheme: base.scheme,
            authority: base.authority,
            path,
            query: reference.query,
            fragment: reference.fragment,
        }
    };

    target.to_string()
}

/// §5.2.3: append a relative path to everything up to the base's last `/`.
fn merge(base: &Uri, reference_path: &str) -> String {
    if base.authority.is_some() && base.path.is_empty() {
        return format!("/{}", reference_path);
    }
    match base.path.rfind('/') {
        Some(pos) => format!("{}{}", &base.path[..=pos], reference_path),
        None => reference_path.to_string(),
    }
}

/// §5.2.4: interpret and remove `.` and `..` segments from a path.
pub fn remove_dot_segments(path: &str) -> String {
    let mut input = path.to_string();
    let mut output = String::with_capacity(path.len());

    while !input.is_empty() {
        if let Some(rest) = input.strip_prefix("../") {
            input = rest.to_string();
        } else if let Some(rest) = input.strip_prefix("./") {
            input = rest.to_string();
        } else if let Some(rest) = input.strip_prefix("/./") {
            input = format!("/{}", rest);
        } else if input == "/." {
            input = "/".to_string();
        } else if let Some(rest) = input.strip_prefix("/../") {
            input = format!("/{}", rest);
            pop_last_segment(&mut output);
        } else if input == "/.." {
            input = "/".to_string();
            pop_last_segment(&mut output);
        } else if input == "." || input == ".." {
            input.clear();
        } else {
            let end = match input.strip_prefix('/') {
                Some(rest) => rest.find('/').map(|i| i + 1),
                None => input.find('/'),
            }
            .unwrap_or(input.len());
            output.push_str(&input[..end]);
            input.replace_range(..end, "");
        }
    }

    output
}

fn pop_last_segment(output: &mut String) {
    let keep = output.rfind('/').unwrap_or(0);
    output.truncate(keep);
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://a/b/c/d;p?q";

    #[test]
    fn test_parse_keeps_empty_and_absent_apart() {
        let with_empty = Uri::parse("http://a/b?#");
        assert_eq!(with_empty.query.as_deref(), Some(""));
        assert_eq!(with_empty.fragment.as_deref(), Some(""));

        let without = Uri::parse("http://a/b");
        assert_eq!(without.scheme.as_deref(), Some("http"));
        assert_eq!(without.authority.as_deref(), Some("a"));
        assert_eq!(without.path, "/b");
        assert!(without.query.is_none());
        assert!(without.fragment.is_none());
    }

    #[test]
    fn test_parse_never_fails_on_garbage() {
        let uri = Uri::parse("::: not a [uri] %%");
        assert!(uri.scheme.is_none());
        assert_eq!(uri.to_string(), "::: not a [uri] %%");
    }

    #[test]
    fn test_normal_examples() {
        let cases = [
            ("g:h", "g:h"),
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            ("g?y#s", "http://a/b/c/g?y#s"),
            (";x", "http://a/b/c/;x"),
            ("g;x", "http://a/b/c/g;x"),
            ("g;x?y#s", "http://a/b/c/g;x?y#s"),
            ("", "http://a/b/c/d;p?q"),
            (".", "http://a/b/c/"),
            ("./", "http://a/b/c/"),
            ("..", "http://a/b/"),
            ("../", "http://a/b/"),
            ("../g", "http://a/b/g"),
            ("../..", "http://a/"),
            ("../../", "http://a/"),
            ("../../g", "http://a/g"),
        ];
        for (reference, expected) in cases {
            assert_eq!(resolve(BASE, reference), expected, "reference {:?}", reference);
        }
    }

    #[test]
    fn test_abnormal_examples() {
        let cases = [
            ("../../../g", "http://a/g"),
            ("../../../../g", "http://a/g"),
            ("/./g", "http://a/g"),
            ("/../g", "http://a/g"),
            ("g.", "http://a/b/c/g."),
            (".g", "http://a/b/c/.g"),
            ("g..", "http://a/b/c/g.."),
            ("..g", "http://a/b/c/..g"),
            ("./../g", "http://a/b/g"),
            ("./g/.", "http://a/b/c/g/"),
            ("g/./h", "http://a/b/c/g/h"),
            ("g/../h", "http://a/b/c/h"),
            ("g;x=1/./y", "http://a/b/c/g;x=1/y"),
            ("g;x=1/../y", "http://a/b/c/y"),
            ("g?y/./x", "http://a/b/c/g?y/./x"),
            ("g?y/../x", "http://a/b/c/g?y/../x"),
            ("g#s/./x", "http://a/b/c/g#s/./x"),
            ("g#s/../x", "http://a/b/c/g#s/../x"),
            ("http:g", "http:g"),
        ];
        for (reference, expected) in cases {
            assert_eq!(resolve(BASE, reference), expected, "reference {:?}", reference);
        }
    }

    #[test]
    fn test_lone_hash_forces_empty_fragment() {
        assert_eq!(resolve(BASE, "#"), "http://a/b/c/d;p?q#");
    }

    #[test]
    fn test_base_without_path_gets_root() {
        assert_eq!(resolve("https://user.example", "auth"), "https://user.example/auth");
        assert_eq!(resolve("https://user.example", ""), "https://user.example/");
    }

    #[test]
    fn test_absolute_reference_is_unchanged() {
        let absolute = "https://auth.example/endpoint?x=1#frag";
        assert_eq!(resolve(BASE, absolute), absolute);
        assert_eq!(resolve("https://other.example/", absolute), absolute);
    }

    #[test]
    fn test_remove_dot_segments_edge_cases() {
        assert_eq!(remove_dot_segments("/.."), "/");
        assert_eq!(remove_dot_segments("/."), "/");
        assert_eq!(remove_dot_segments("."), "");
        assert_eq!(remove_dot_segments(".."), "");
        assert_eq!(remove_dot_segments("/a/b/c/./../../g"), "/a/g");
        assert_eq!(remove_dot_segments("mid/content=5/../6"), "mid/6");
    }

    #[test]
    fn test_remove_dot_segments_is_identity_without_dots() {
        for path in ["", "/", "/a/b/c", "a/b", "/a//b/", "/.well-known/x", "/a..b/c."] {
            assert_eq!(remove_dot_segments(path), path);
        }
    }
}
