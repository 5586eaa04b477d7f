//! Pattern matching tests for the public tokenizer and route entries.

mod common;

use common::*;
use dispatch_navigator::matching::TokenizedPath;
use dispatch_navigator::route::{expand_optional, strip_base_path};
use dispatch_navigator::*;

#[test]
fn test_literal_patterns_match_themselves() {
    for pattern in ["/", "/about", "/a/b/c", "/with.dot", "/x-y_z"] {
        let path = TokenizedPath::parse(pattern).unwrap();
        let params = path.matches(pattern).unwrap();
        assert!(params.is_empty(), "{pattern}");

        if pattern != "/" {
            let trailing = format!("{pattern}/");
            assert!(path.matches(&trailing).is_some(), "{trailing}");
        }
    }
}

#[test]
fn test_segment_count_must_agree() {
    let path = TokenizedPath::parse("/users/:id").unwrap();
    assert!(path.matches("/users").is_none());
    assert!(path.matches("/users/1/posts").is_none());
    assert!(path.matches("/users/").is_none());
}

#[test]
fn test_multiple_params() {
    let path = TokenizedPath::parse("/users/:user_id/posts/:post_id").unwrap();
    let params = path.matches("/users/7/posts/99").unwrap();
    assert_param_equals(&params, "user_id", "7");
    assert_param_equals(&params, "post_id", "99");
    assert_eq!(params.get_as::<u32>("post_id"), Some(99));
}

#[test]
fn test_numeric_constraint() {
    let path = TokenizedPath::parse("/page/:num(\\d+)").unwrap();
    assert_param_equals(&path.matches("/page/12").unwrap(), "num", "12");
    assert!(path.matches("/page/twelve").is_none());
}

#[test]
fn test_wildcard_section() {
    let path = TokenizedPath::parse("/files/*/raw").unwrap();
    assert!(path.matches("/files/a/raw").is_some());
    assert!(path.matches("/files/b/raw").is_some());
    assert!(path.matches("/files/a/cooked").is_none());
}

#[test]
fn test_tail_binds_where_sections_line_up() {
    let path = TokenizedPath::parse("/docs/:page*").unwrap();
    let params = path.matches("/docs/guide/install").unwrap();
    assert_param_equals(&params, "page", "guide");
    assert!(path.matches("/blog/guide").is_none());
}

#[test]
fn test_home_star() {
    let path = TokenizedPath::parse("/home*").unwrap();
    for candidate in ["/home", "/homer", "/home/test", "/home/"] {
        assert!(path.matches(candidate).is_some(), "{candidate}");
    }
    assert!(path.matches("/away").is_none());
}

#[test]
fn test_malformed_patterns_fail_fast() {
    for pattern in ["/:", "/user/:na-me", "/user/:id(\\d+", "/user/:id([)"] {
        let err = TokenizedPath::parse(pattern).unwrap_err();
        assert!(
            matches!(err, NavigationError::MalformedPattern { .. }),
            "{pattern}: {err}"
        );
        assert!(err.is_configuration());
    }
}

#[test]
fn test_router_rejects_malformed_route() {
    let mut router = Router::new();
    assert!(router.route("/user/:id(\\d+", vec![]).is_err());
    assert!(router.routes().is_empty());
}

#[test]
fn test_strip_base_path() {
    assert_eq!(strip_base_path("/mount", "/mount"), Some(""));
    assert_eq!(strip_base_path("/mount/", "/mount"), Some("/"));
    assert_eq!(strip_base_path("/mount/a/b", "/mount"), Some("/a/b"));
    assert_eq!(strip_base_path("/elsewhere/a", "/mount"), None);
}

#[test]
fn test_optional_expansion_forms() {
    assert_eq!(
        expand_optional("/about/:person?"),
        Some(("/about".to_string(), "/about/:person".to_string()))
    );
    assert_eq!(
        expand_optional("/:lang?"),
        Some(("/".to_string(), "/:lang".to_string()))
    );
    assert_eq!(expand_optional("/plain"), None);
}

#[test]
fn test_entry_test_has_no_side_effects() {
    let entry = RouteEntry::new("/users/:id", vec![]).unwrap();
    let params = entry.test("/users/5", "").unwrap();
    assert_param_equals(&params, "id", "5");

    let ctx = NavigationContext::new("/users/5", None);
    assert!(ctx.params.is_none());
}
