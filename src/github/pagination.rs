//! Page draining for GitHub list endpoints

use crate::error::Result;

/// One page of a listing plus the URL of the following page, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Fetch `first` and keep following `next` until the provider reports no more
/// pages, accumulating every item. An error on any page fails the whole listing.
pub fn drain_pages<T, F>(first: String, mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(&str) -> Result<Page<T>>,
{
    let mut items = Vec::new();
    let mut url = Some(first);
    while let Some(current) = url {
        let page = fetch(&current)?;
        items.extend(page.items);
        // Guard against a provider pointing a page at itself.
        url = page.next.filter(|next| *next != current);
    }
    Ok(items)
}

/// Extract the `rel="next"` target from an RFC 8288 `Link` header
pub fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|param| {
            let param = param.trim();
            param == r#"rel="next""# || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReleaseError;

    #[test]
    fn test_next_link_found() {
        let header = r#"<https://api.github.com/repositories/1/pulls?page=2>; rel="next", <https://api.github.com/repositories/1/pulls?page=5>; rel="last""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/repositories/1/pulls?page=2")
        );
    }

    #[test]
    fn test_next_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/x?page=1>; rel="first", <https://api.github.com/x?page=4>; rel="prev""#;
        assert_eq!(next_link(header), None);
    }

    #[test]
    fn test_drain_pages_accumulates_all_pages() {
        let pages = vec![
            ("p1", vec![1, 2], Some("p2")),
            ("p2", vec![3], Some("p3")),
            ("p3", vec![4, 5], None),
        ];
        let mut requested = Vec::new();
        let items = drain_pages("p1".to_string(), |url| {
            requested.push(url.to_string());
            let (_, items, next) = pages.iter().find(|(name, _, _)| *name == url).unwrap();
            Ok(Page {
                items: items.clone(),
                next: next.map(str::to_string),
            })
        })
        .unwrap();
        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(requested, vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_drain_pages_fails_on_any_page_error() {
        let result: Result<Vec<u32>> = drain_pages("p1".to_string(), |url| {
            if url == "p1" {
                Ok(Page {
                    items: vec![1],
                    next: Some("p2".to_string()),
                })
            } else {
                Err(ReleaseError::GithubApi {
                    url: url.to_string(),
                    status: 502,
                    body: String::new(),
                })
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_drain_pages_stops_on_self_reference() {
        let mut calls = 0;
        let items = drain_pages("same".to_string(), |_| {
            calls += 1;
            Ok(Page {
                items: vec![calls],
                next: Some("same".to_string()),
            })
        })
        .unwrap();
        assert_eq!(items, vec![1]);
    }
}
