//! Image loading optimization.
//!
//! Every `<img>` visited during the walk is annotated from the asset
//! metadata side-table: loading/priority attributes, intrinsic size,
//! placeholder, responsive sources. At most one image per document gets
//! the eager LCP slot; the walk threads that flag through, it is never
//! process state.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::model::AssetMeta;

/// Class names that make an un-annotated image an LCP candidate.
const HERO_CLASSES: &[&str] = &["hero", "banner", "cover", "main-image"];

/// Build the URL-keyed metadata lookup from the request's asset list.
pub fn build_asset_map(assets: &[AssetMeta]) -> FxHashMap<&str, &AssetMeta> {
    let mut map = FxHashMap::default();
    for asset in assets {
        if let Some(key) = asset.key() {
            map.entry(key).or_insert(asset);
        }
    }
    map
}

/// Resource hint the caller renders as `<link rel="preload">`.
///
/// Order-significant: first entries are highest priority. The core never
/// deduplicates; suppression is the caller's call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreloadResource {
    pub href: String,
    #[serde(rename = "as")]
    pub r#as: &'static str,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime: Option<&'static str>,
    pub fetch_priority: &'static str,
}

impl PreloadResource {
    pub fn image(href: &str) -> Self {
        Self {
            href: href.to_owned(),
            r#as: "image",
            mime: image_mime_type(href),
            fetch_priority: "high",
        }
    }
}

/// MIME type sniffed from the URL's extension, for preload hints.
pub fn image_mime_type(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let ext = path.rsplit('.').next()?;
    match ext.to_ascii_lowercase().as_str() {
        "avif" => Some("image/avif"),
        "webp" => Some("image/webp"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Annotate one `<img>`; returns true when it received the LCP slot.
///
/// No-op on images without `src`. The loading decision only applies when
/// the author left `loading` unset; an explicit value always wins.
pub fn enhance_image(
    doc: &mut Document,
    img: NodeId,
    assets: &FxHashMap<&str, &AssetMeta>,
    lcp_assigned: bool,
) -> bool {
    let Some(src) = doc.attr(img, "src").map(str::to_owned) else {
        return false;
    };
    if src.is_empty() {
        return false;
    }

    let meta = assets.get(src.as_str()).copied();
    let mut granted = false;

    if doc.attr(img, "loading").is_none() {
        let forced = meta.is_some_and(|m| m.priority);
        let hero = !lcp_assigned && is_hero_candidate(doc, img);
        if forced || hero {
            doc.set_attr(img, "loading", "eager");
            doc.set_attr(img, "fetchpriority", "high");
            granted = true;
        } else {
            doc.set_attr(img, "loading", "lazy");
        }
    }

    if doc.attr(img, "decoding").is_none() {
        doc.set_attr(img, "decoding", "async");
    }

    if let Some(meta) = meta {
        if doc.attr(img, "alt").is_none() {
            doc.set_attr(img, "alt", meta.alt.as_deref().unwrap_or(""));
        }
        if doc.attr(img, "width").is_none()
            && let Some(width) = meta.width
        {
            doc.set_attr(img, "width", &width.to_string());
        }
        if doc.attr(img, "height").is_none()
            && let Some(height) = meta.height
        {
            doc.set_attr(img, "height", &height.to_string());
        }
        if let Some(placeholder) = meta.placeholder.as_deref() {
            doc.set_attr(img, "data-placeholder", placeholder);
        }

        if !meta.sources.is_empty() {
            apply_picture_sources(doc, img, meta);
        } else if doc.attr(img, "srcset").is_none()
            && let Some(srcset) = meta.src_set.as_deref()
        {
            doc.set_attr(img, "srcset", srcset);
        }

        if doc.attr(img, "sizes").is_none()
            && let Some(sizes) = meta.sizes.as_deref()
        {
            doc.set_attr(img, "sizes", sizes);
        }
    }

    granted
}

fn is_hero_candidate(doc: &Document, img: NodeId) -> bool {
    HERO_CLASSES.iter().any(|class| doc.has_class(img, class))
}

/// Wrap the image in a `<picture>` (reusing an existing ancestor) and
/// prepend one `<source>` per metadata entry. Existing sources are
/// cleared first so a re-run never duplicates them.
fn apply_picture_sources(doc: &mut Document, img: NodeId, meta: &AssetMeta) {
    let picture = match doc.closest(img, |d, id| d.tag(id) == Some("picture")) {
        Some(existing) => existing,
        None => doc.wrap_in_new(img, "picture"),
    };

    doc.remove_child_elements_by_tag(picture, "source");

    // Prepend in reverse so the serialized order matches the metadata.
    for source in meta.sources.iter().rev() {
        let Some(srcset) = source.effective_srcset() else {
            continue;
        };
        let srcset = srcset.to_owned();
        let node = doc.new_element("source");
        doc.set_attr(node, "srcset", &srcset);
        if let Some(mime) = source.mime.clone() {
            doc.set_attr(node, "type", &mime);
        }
        if let Some(media) = source.media.clone() {
            doc.set_attr(node, "media", &media);
        }
        doc.prepend_child(picture, node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PictureSource;

    #[test]
    fn test_no_src_is_noop() {
        let mut doc = Document::parse("<img class=\"hero\">").unwrap();
        let img = doc.first_by_tag(doc.root(), "img").unwrap();
        let map = FxHashMap::default();
        assert!(!enhance_image(&mut doc, img, &map, false));
        assert!(doc.attr(img, "loading").is_none());
    }

    #[test]
    fn test_lcp_granted_once() {
        let mut doc =
            Document::parse(r#"<img class="hero" src="/a.png"><img class="hero" src="/b.png">"#)
                .unwrap();
        let imgs = doc.all_by_tag(doc.root(), "img");
        let map = FxHashMap::default();

        let mut lcp = false;
        let mut grants = 0;
        for img in imgs {
            if enhance_image(&mut doc, img, &map, lcp) {
                lcp = true;
                grants += 1;
            }
        }
        assert_eq!(grants, 1);

        let html = doc.to_html();
        assert!(html.contains(r#"src="/a.png" loading="eager" fetchpriority="high""#), "{html}");
        assert!(html.contains(r#"src="/b.png" loading="lazy""#), "{html}");
    }

    #[test]
    fn test_metadata_priority_overrides_fold_state() {
        let mut doc = Document::parse(r#"<img src="/forced.webp">"#).unwrap();
        let img = doc.first_by_tag(doc.root(), "img").unwrap();
        let list = vec![AssetMeta {
            src: Some("/forced.webp".into()),
            priority: true,
            ..Default::default()
        }];
        let map = build_asset_map(&list);
        assert!(enhance_image(&mut doc, img, &map, true));
        assert_eq!(doc.attr(img, "loading"), Some("eager"));
    }

    #[test]
    fn test_existing_loading_attribute_wins() {
        let mut doc = Document::parse(r#"<img class="hero" src="/a.png" loading="lazy">"#).unwrap();
        let img = doc.first_by_tag(doc.root(), "img").unwrap();
        let map = FxHashMap::default();
        assert!(!enhance_image(&mut doc, img, &map, false));
        assert_eq!(doc.attr(img, "loading"), Some("lazy"));
        assert_eq!(doc.attr(img, "decoding"), Some("async"));
    }

    #[test]
    fn test_metadata_fills_alt_size_placeholder() {
        let mut doc = Document::parse(r#"<img src="/p.jpg">"#).unwrap();
        let img = doc.first_by_tag(doc.root(), "img").unwrap();
        let list = vec![AssetMeta {
            src: Some("/p.jpg".into()),
            alt: Some("A product".into()),
            width: Some(800),
            height: Some(600),
            placeholder: Some("data:image/gif;base64,R0".into()),
            ..Default::default()
        }];
        let map = build_asset_map(&list);
        enhance_image(&mut doc, img, &map, true);
        assert_eq!(doc.attr(img, "alt"), Some("A product"));
        assert_eq!(doc.attr(img, "width"), Some("800"));
        assert_eq!(doc.attr(img, "height"), Some("600"));
        assert_eq!(doc.attr(img, "data-placeholder"), Some("data:image/gif;base64,R0"));
    }

    #[test]
    fn test_sources_wrap_in_picture_without_duplicates() {
        let mut doc = Document::parse(r#"<div><img src="/p.jpg"></div>"#).unwrap();
        let img = doc.first_by_tag(doc.root(), "img").unwrap();
        let list = vec![AssetMeta {
            src: Some("/p.jpg".into()),
            sources: vec![
                PictureSource {
                    srcset: Some("/p.avif".into()),
                    mime: Some("image/avif".into()),
                    ..Default::default()
                },
                PictureSource {
                    srcset: Some("/p.webp".into()),
                    mime: Some("image/webp".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }];
        let map = build_asset_map(&list);

        enhance_image(&mut doc, img, &map, true);
        // Second pass must not duplicate sources.
        enhance_image(&mut doc, img, &map, true);

        let picture = doc.first_by_tag(doc.root(), "picture").unwrap();
        let sources = doc.all_by_tag(picture, "source");
        assert_eq!(sources.len(), 2);
        assert_eq!(doc.attr(sources[0], "srcset"), Some("/p.avif"));
        assert_eq!(doc.attr(sources[1], "srcset"), Some("/p.webp"));
        assert_eq!(doc.parent(img), Some(picture));
    }

    #[test]
    fn test_flat_srcset_applied_directly() {
        let mut doc = Document::parse(r#"<img src="/p.jpg">"#).unwrap();
        let img = doc.first_by_tag(doc.root(), "img").unwrap();
        let list = vec![AssetMeta {
            src: Some("/p.jpg".into()),
            src_set: Some("/p-480.jpg 480w, /p-960.jpg 960w".into()),
            sizes: Some("(max-width: 600px) 480px, 960px".into()),
            ..Default::default()
        }];
        let map = build_asset_map(&list);
        enhance_image(&mut doc, img, &map, true);
        assert_eq!(doc.attr(img, "srcset"), Some("/p-480.jpg 480w, /p-960.jpg 960w"));
        assert!(doc.attr(img, "sizes").is_some());
        assert!(doc.first_by_tag(doc.root(), "picture").is_none());
    }

    #[test]
    fn test_mime_sniffing() {
        assert_eq!(image_mime_type("/x/y.webp?v=2"), Some("image/webp"));
        assert_eq!(image_mime_type("/x/y.JPG"), Some("image/jpeg"));
        assert_eq!(image_mime_type("/x/no-ext"), None);
    }

    #[test]
    fn test_asset_map_first_key_wins() {
        let list = vec![
            AssetMeta { src: Some("/a.png".into()), alt: Some("first".into()), ..Default::default() },
            AssetMeta { src: Some("/a.png".into()), alt: Some("second".into()), ..Default::default() },
        ];
        let map = build_asset_map(&list);
        assert_eq!(map["/a.png"].alt.as_deref(), Some("first"));
    }
}
