//! Carousel (slideshow) first-paint processing.
//!
//! Runs after injection over the same parsed tree:
//! - discovers every carousel root (plus product-detail main galleries),
//! - classifies each as above/below the fold (first in document order
//!   wins the fold),
//! - rewrites slide image loading attributes accordingly,
//! - pins an explicit height so the page does not shift while the
//!   carousel runtime loads,
//! - emits one inert init-script descriptor per instance for the caller
//!   to ship client-side.

use serde_json::json;

use crate::dom::{Document, NodeId};

/// Class of a standard carousel's outer root element.
pub const CAROUSEL_ROOT_CLASS: &str = "gjs-swiper-root";
/// Class of the inner carousel container.
pub const CAROUSEL_CONTAINER_CLASS: &str = "swiper";
/// Class of one slide.
pub const CAROUSEL_SLIDE_CLASS: &str = "swiper-slide";
/// Class of the product-detail main gallery container.
pub const GALLERY_MAIN_CLASS: &str = "pd-gallery-main";
/// Class of the product-detail thumbnail strip container.
pub const GALLERY_THUMBS_CLASS: &str = "pd-gallery-thumbs";

/// Default pinned height when the author set none.
const DEFAULT_HEIGHT: &str = "height: 70vh";

// =============================================================================
// Configuration
// =============================================================================

/// Per-instance options read once from the root's data attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct CarouselConfig {
    pub looped: bool,
    pub autoplay: bool,
    pub delay: u32,
    pub effect: String,
    pub speed: u32,
    pub slides_per_view: f64,
    pub space_between: u32,
    pub centered_slides: bool,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            looped: true,
            autoplay: true,
            delay: 2500,
            effect: "slide".into(),
            speed: 300,
            slides_per_view: 1.0,
            space_between: 0,
            centered_slides: false,
        }
    }
}

impl CarouselConfig {
    /// Read from data attributes; absent or unparsable values keep the
    /// documented default.
    pub fn read(doc: &Document, root: NodeId) -> Self {
        let defaults = Self::default();
        Self {
            looped: bool_attr(doc, root, "data-loop", defaults.looped),
            autoplay: bool_attr(doc, root, "data-autoplay", defaults.autoplay),
            delay: num_attr(doc, root, "data-delay", defaults.delay),
            effect: doc
                .attr(root, "data-effect")
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .unwrap_or(defaults.effect),
            speed: num_attr(doc, root, "data-speed", defaults.speed),
            slides_per_view: num_attr(doc, root, "data-slides-per-view", defaults.slides_per_view),
            space_between: num_attr(doc, root, "data-space-between", defaults.space_between),
            centered_slides: bool_attr(doc, root, "data-centered-slides", defaults.centered_slides),
        }
    }
}

fn bool_attr(doc: &Document, id: NodeId, name: &str, default: bool) -> bool {
    match doc.attr(id, name) {
        Some(value) => value == "true",
        None => default,
    }
}

fn num_attr<T: std::str::FromStr>(doc: &Document, id: NodeId, name: &str, default: T) -> T {
    doc.attr(id, name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

// =============================================================================
// Output
// =============================================================================

/// Carousel family, names the init-script shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselKind {
    Standard,
    ProductGallery,
}

impl CarouselKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ProductGallery => "product-detail",
        }
    }
}

/// One init-script descriptor handed back to the caller. `content` is
/// inert text, executed later in the browser once the carousel runtime
/// is available.
#[derive(Debug, Clone)]
pub struct CarouselScript {
    pub index: usize,
    pub content: String,
    pub is_above_fold: bool,
    pub priority: &'static str,
    pub kind: CarouselKind,
}

/// Result of the carousel pass over one document.
#[derive(Debug, Clone, Default)]
pub struct CarouselOutcome {
    pub scripts: Vec<CarouselScript>,
    pub has_carousels: bool,
    /// Whether the first carousel sits above the fold; drives eager vs
    /// lazy loading of the runtime library by the caller.
    pub first_above_fold: bool,
}

// =============================================================================
// Processing
// =============================================================================

/// Process every carousel in the document.
pub fn process_carousels(doc: &mut Document) -> CarouselOutcome {
    let roots = doc.all_by_class(doc.root(), CAROUSEL_ROOT_CLASS);
    let galleries: Vec<NodeId> = doc
        .all_by_class(doc.root(), GALLERY_MAIN_CLASS)
        .into_iter()
        .filter(|&id| doc.has_class(id, CAROUSEL_CONTAINER_CLASS))
        .collect();

    if roots.is_empty() && galleries.is_empty() {
        return CarouselOutcome::default();
    }

    let mut outcome = CarouselOutcome {
        has_carousels: true,
        ..Default::default()
    };
    let mut index = 0usize;

    for root in roots {
        let Some(container) = doc.first_by_class(root, CAROUSEL_CONTAINER_CLASS) else {
            warn!("carousel"; "carousel root {index} has no inner container, skipping");
            continue;
        };

        let config = CarouselConfig::read(doc, root);
        let above_fold = index == 0;
        if above_fold {
            outcome.first_above_fold = true;
            optimize_first_slide(doc, container);
        } else {
            lazy_load_slides(doc, container);
        }

        ensure_fixed_height(doc, root, container);

        let priority = if above_fold { "high" } else { "low" };
        doc.set_attr(container, "data-swiper-index", &index.to_string());
        doc.set_attr(container, "data-swiper-priority", priority);

        let selector = format!(".swiper[data-swiper-index=\"{index}\"]");
        outcome.scripts.push(CarouselScript {
            index,
            content: standard_init_script(&selector, &config, above_fold),
            is_above_fold: above_fold,
            priority,
            kind: CarouselKind::Standard,
        });
        index += 1;
    }

    for main in galleries {
        let Some(detail) = doc.closest(main, |d, id| {
            d.attr(id, "data-component-type") == Some("product-detail")
        }) else {
            warn!("carousel"; "gallery carousel outside a product-detail container, skipping");
            continue;
        };

        let thumbs = doc
            .first_by_class(detail, GALLERY_THUMBS_CLASS)
            .filter(|&id| doc.has_class(id, CAROUSEL_CONTAINER_CLASS));

        let above_fold = doc.attr(main, "data-swiper-priority") == Some("high") || index == 0;
        if index == 0 {
            outcome.first_above_fold = true;
        }

        if above_fold {
            optimize_first_slide(doc, main);
            if let Some(thumbs) = thumbs {
                optimize_first_slide(doc, thumbs);
            }
        } else {
            lazy_load_slides(doc, main);
            if let Some(thumbs) = thumbs {
                lazy_load_slides(doc, thumbs);
            }
        }

        let priority = if above_fold { "high" } else { "low" };
        doc.set_attr(main, "data-swiper-index", &index.to_string());
        doc.set_attr(main, "data-swiper-priority", priority);

        let thumb_selector = thumbs.map(|id| {
            let key = format!("{index}-thumbs");
            doc.set_attr(id, "data-swiper-index", &key);
            doc.set_attr(id, "data-swiper-priority", priority);
            format!(".{GALLERY_THUMBS_CLASS}[data-swiper-index=\"{key}\"]")
        });
        let main_selector = format!(".{GALLERY_MAIN_CLASS}[data-swiper-index=\"{index}\"]");

        outcome.scripts.push(CarouselScript {
            index,
            content: gallery_init_script(&main_selector, thumb_selector.as_deref(), above_fold),
            is_above_fold: above_fold,
            priority,
            kind: CarouselKind::ProductGallery,
        });
        index += 1;
    }

    outcome
}

/// Eager-load the first slide's first image; flag background-image
/// slides for the caller to preload.
fn optimize_first_slide(doc: &mut Document, container: NodeId) {
    let Some(slide) = doc.first_by_class(container, CAROUSEL_SLIDE_CLASS) else {
        return;
    };

    if let Some(img) = doc.first_by_tag(slide, "img") {
        doc.set_attr(img, "loading", "eager");
        doc.set_attr(img, "fetchpriority", "high");
        doc.remove_class(img, "swiper-lazy");
    } else if doc
        .attr(slide, "style")
        .is_some_and(|s| s.contains("background-image"))
    {
        doc.set_attr(slide, "data-preload-bg", "true");
    }
}

/// Lazy-load every slide image unless the author already marked it
/// eager; only fill `fetchpriority` when absent.
fn lazy_load_slides(doc: &mut Document, container: NodeId) {
    for slide in doc.all_by_class(container, CAROUSEL_SLIDE_CLASS) {
        for img in doc.all_by_tag(slide, "img") {
            if doc.attr(img, "loading") == Some("eager") {
                continue;
            }
            doc.set_attr(img, "loading", "lazy");
            if doc.attr(img, "fetchpriority").is_none() {
                doc.set_attr(img, "fetchpriority", "low");
            }
        }
    }
}

/// Pin a default height on root and container when neither carries any
/// height in its inline style. Prevents layout shift before the runtime
/// measures the slides.
fn ensure_fixed_height(doc: &mut Document, root: NodeId, container: NodeId) {
    if doc.style_mentions_height(root) || doc.style_mentions_height(container) {
        return;
    }
    doc.append_style(container, DEFAULT_HEIGHT);
    doc.append_style(root, DEFAULT_HEIGHT);
}

// =============================================================================
// Init-script generation
// =============================================================================

fn options_json(config: &CarouselConfig) -> String {
    let mut options = json!({
        "loop": config.looped,
        "effect": config.effect,
        "speed": config.speed,
        "slidesPerView": config.slides_per_view,
        "spaceBetween": config.space_between,
        "centeredSlides": config.centered_slides,
    });
    if config.autoplay {
        options["autoplay"] = json!({
            "delay": config.delay,
            "disableOnInteraction": false,
        });
    }
    serde_json::to_string_pretty(&options).unwrap_or_else(|_| "{}".into())
}

/// Wrap an init function body in the immediate (above-fold) or
/// observer-gated (below-fold) trigger.
fn trigger_block(selector: &str, function_name: &str, above_fold: bool) -> String {
    if above_fold {
        format!(
            "  if (document.readyState === 'loading') {{\n\
             \x20   document.addEventListener('DOMContentLoaded', {function_name});\n\
             \x20 }} else {{\n\
             \x20   {function_name}();\n\
             \x20 }}"
        )
    } else {
        format!(
            "  if ('IntersectionObserver' in window) {{\n\
             \x20   const el = document.querySelector('{selector}');\n\
             \x20   if (el) {{\n\
             \x20     const observer = new IntersectionObserver((entries) => {{\n\
             \x20       entries.forEach(entry => {{\n\
             \x20         if (entry.isIntersecting) {{\n\
             \x20           {function_name}();\n\
             \x20           observer.disconnect();\n\
             \x20         }}\n\
             \x20       }});\n\
             \x20     }}, {{ rootMargin: '200px' }});\n\
             \x20     observer.observe(el);\n\
             \x20   }}\n\
             \x20 }} else {{\n\
             \x20   if (document.readyState === 'loading') {{\n\
             \x20     document.addEventListener('DOMContentLoaded', {function_name});\n\
             \x20   }} else {{\n\
             \x20     {function_name}();\n\
             \x20   }}\n\
             \x20 }}"
        )
    }
}

fn standard_init_script(selector: &str, config: &CarouselConfig, above_fold: bool) -> String {
    let function_name = if above_fold {
        "initSwiperImmediate"
    } else {
        "initSwiperLazy"
    };
    let options = options_json(config);
    let trigger = trigger_block(selector, function_name, above_fold);

    format!(
        "(function() {{\n\
         \x20 function {function_name}() {{\n\
         \x20   const swiperEl = document.querySelector('{selector}');\n\
         \x20   if (!swiperEl || swiperEl.__swiper_initialized) return;\n\
         \x20   if (typeof Swiper === 'undefined') {{\n\
         \x20     console.warn('Swiper library not loaded yet');\n\
         \x20     return;\n\
         \x20   }}\n\
         \x20   const pagination = swiperEl.querySelector('.swiper-pagination');\n\
         \x20   const nextBtn = swiperEl.querySelector('.swiper-button-next');\n\
         \x20   const prevBtn = swiperEl.querySelector('.swiper-button-prev');\n\
         \x20   const config = {options};\n\
         \x20   if (pagination) {{\n\
         \x20     config.pagination = {{ el: pagination, clickable: true }};\n\
         \x20   }}\n\
         \x20   if (nextBtn && prevBtn) {{\n\
         \x20     config.navigation = {{ nextEl: nextBtn, prevEl: prevBtn }};\n\
         \x20   }}\n\
         \x20   if (swiperEl.parentElement.closest('.swiper')) {{\n\
         \x20     config.nested = true;\n\
         \x20   }}\n\
         \x20   try {{\n\
         \x20     const instance = new Swiper(swiperEl, config);\n\
         \x20     swiperEl.__swiper_initialized = true;\n\
         \x20     swiperEl.__swiper_instance = instance;\n\
         \x20   }} catch (error) {{\n\
         \x20     console.error('Swiper initialization failed:', error);\n\
         \x20   }}\n\
         \x20 }}\n\
         {trigger}\n\
         }})();"
    )
}

fn gallery_init_script(
    main_selector: &str,
    thumb_selector: Option<&str>,
    above_fold: bool,
) -> String {
    let function_name = if above_fold {
        "initGallerySwiperImmediate"
    } else {
        "initGallerySwiperLazy"
    };

    let thumbs_init = match thumb_selector {
        Some(selector) => format!(
            "    const thumbEl = document.querySelector('{selector}');\n\
             \x20   let thumbsSwiper = null;\n\
             \x20   if (thumbEl && !thumbEl.__swiper_initialized) {{\n\
             \x20     try {{\n\
             \x20       thumbsSwiper = new Swiper(thumbEl, {{\n\
             \x20         spaceBetween: 10,\n\
             \x20         slidesPerView: 4,\n\
             \x20         freeMode: true,\n\
             \x20         watchSlidesProgress: true,\n\
             \x20         breakpoints: {{\n\
             \x20           640: {{ slidesPerView: 5 }},\n\
             \x20           768: {{ slidesPerView: 6 }},\n\
             \x20           1024: {{ slidesPerView: 7 }}\n\
             \x20         }}\n\
             \x20       }});\n\
             \x20       thumbEl.__swiper_initialized = true;\n\
             \x20       thumbEl.__swiper_instance = thumbsSwiper;\n\
             \x20     }} catch (error) {{\n\
             \x20       console.error('Gallery thumbs initialization failed:', error);\n\
             \x20     }}\n\
             \x20   }}\n"
        ),
        None => String::new(),
    };
    let thumbs_option = if thumb_selector.is_some() {
        ",\n      thumbs: thumbsSwiper ? { swiper: thumbsSwiper } : undefined"
    } else {
        ""
    };
    let trigger = trigger_block(main_selector, function_name, above_fold);

    format!(
        "(function() {{\n\
         \x20 function {function_name}() {{\n\
         \x20   const mainEl = document.querySelector('{main_selector}');\n\
         \x20   if (!mainEl || mainEl.__swiper_initialized) return;\n\
         \x20   if (typeof Swiper === 'undefined') {{\n\
         \x20     console.warn('Swiper library not loaded yet');\n\
         \x20     return;\n\
         \x20   }}\n\
         {thumbs_init}\
         \x20   try {{\n\
         \x20     const mainConfig = {{\n\
         \x20     loop: true,\n\
         \x20     spaceBetween: 10,\n\
         \x20     navigation: {{\n\
         \x20       nextEl: mainEl.querySelector('.swiper-button-next'),\n\
         \x20       prevEl: mainEl.querySelector('.swiper-button-prev')\n\
         \x20     }},\n\
         \x20     pagination: {{\n\
         \x20       el: mainEl.querySelector('.swiper-pagination'),\n\
         \x20       clickable: true\n\
         \x20     }}{thumbs_option}\n\
         \x20   }};\n\
         \x20     const mainSwiper = new Swiper(mainEl, mainConfig);\n\
         \x20     mainEl.__swiper_initialized = true;\n\
         \x20     mainEl.__swiper_instance = mainSwiper;\n\
         \x20   }} catch (error) {{\n\
         \x20     console.error('Gallery initialization failed:', error);\n\
         \x20   }}\n\
         \x20 }}\n\
         {trigger}\n\
         }})();"
    )
}

// =============================================================================
// Tests
// =============================================================================
