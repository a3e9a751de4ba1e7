use std::borrow::Cow;

use super::content::{
    Feature, Testimonial, BRAND, CARD_ICON_URL, FEATURES, SOCIAL_LINKS, TAGLINE, TESTIMONIALS,
};
use super::{LandingView, Navigation, Section, HOME_ROUTE, LOGIN_ROUTE, SIGNUP_ROUTE};

/// Hides animated sections until they first scroll into view.
const PAGE_STYLE: &str = "html{scroll-behavior:smooth}\
.js [data-reveal=once]{opacity:0;transform:translateY(24px);transition:opacity .6s,transform .6s}\
.js [data-reveal=once].revealed{opacity:1;transform:none}";

/// Reveals each `data-reveal="once"` section the first time it intersects
/// the viewport, and turns `data-scroll` links into smooth scrolls that leave
/// the location untouched. A missing scroll target does nothing.
pub const PAGE_SCRIPT: &str = "(function(){\
document.documentElement.classList.add('js');\
document.querySelectorAll('[data-scroll]').forEach(function(a){\
a.addEventListener('click',function(e){\
e.preventDefault();\
var t=a.getAttribute('data-scroll');\
if(t==='top'){window.scrollTo({top:0,behavior:'smooth'});return;}\
var s=document.getElementById(t);\
if(s){s.scrollIntoView({behavior:'smooth'});}\
});\
});\
var sections=document.querySelectorAll('[data-reveal=once]');\
if(!('IntersectionObserver' in window)){\
sections.forEach(function(s){s.classList.add('revealed');});\
return;\
}\
var observer=new IntersectionObserver(function(entries){\
entries.forEach(function(e){\
if(e.isIntersecting){e.target.classList.add('revealed');observer.unobserve(e.target);}\
});\
});\
sections.forEach(function(s){observer.observe(s);});\
})();";

pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

fn section_open(section: Section, class: &str) -> String {
    let reveal = if section.animates() {
        " data-reveal=\"once\""
    } else {
        ""
    };
    format!(
        "<section id=\"{}\" class=\"{}\"{}>",
        section.anchor_id(),
        class,
        reveal
    )
}

fn link(nav: Navigation, label: &str) -> String {
    let target = if nav.opens_new_context() {
        " target=\"_blank\" rel=\"noopener noreferrer\""
    } else {
        ""
    };
    format!(
        "<a href=\"{}\"{}>{}</a>",
        escape(nav.href()),
        target,
        escape(label)
    )
}

fn header() -> String {
    format!(
        "<header><nav>{}<a href=\"#{}\" data-scroll=\"top\">About</a>{}{}</nav></header>",
        link(Navigation::Route(HOME_ROUTE), BRAND),
        Section::Hero.anchor_id(),
        link(Navigation::Route(LOGIN_ROUTE), "Login"),
        link(Navigation::Route(SIGNUP_ROUTE), "Sign Up"),
    )
}

fn hero() -> String {
    format!(
        "{}<h1>{}</h1><p>{}</p>\
         <a class=\"button\" href=\"#{3}\" data-scroll=\"{3}\">Get Started</a></section>",
        section_open(Section::Hero, "hero"),
        escape(BRAND),
        escape(TAGLINE),
        Section::CallToAction.anchor_id(),
    )
}

fn feature_card(feature: &Feature) -> String {
    format!(
        "<article class=\"feature\" data-icon=\"{}\"><h3>{}</h3><p>{}</p></article>",
        escape(feature.icon),
        escape(feature.title),
        escape(feature.description)
    )
}

fn features() -> String {
    let cards: String = FEATURES.iter().map(feature_card).collect();
    format!(
        "{}<h2>Why {}?</h2>{}</section>",
        section_open(Section::Features, "features"),
        escape(BRAND),
        cards
    )
}

/// The card links to the page with the opposite flip state.
fn flip_card(view: &LandingView) -> String {
    let (class, toggled) = if view.card_flipped() {
        ("card flipped", false)
    } else {
        ("card", true)
    };
    format!(
        "{}<a class=\"{}\" href=\"{}?flipped={}\" aria-pressed=\"{}\">\
         <img class=\"card-front\" src=\"{}\" alt=\"{} icon\">\
         <span class=\"card-back\">{}</span></a></section>",
        section_open(Section::FlipCard, "flip"),
        class,
        HOME_ROUTE,
        toggled,
        view.card_flipped(),
        escape(CARD_ICON_URL),
        escape(BRAND),
        escape(TAGLINE),
    )
}

fn testimonial(testimonial: &Testimonial) -> String {
    format!(
        "<figure class=\"testimonial\"><img src=\"{}\" alt=\"{}\">\
         <blockquote>{}</blockquote><figcaption>{}, {}</figcaption></figure>",
        escape(testimonial.avatar_url),
        escape(testimonial.name),
        escape(testimonial.text),
        escape(testimonial.name),
        escape(testimonial.role),
    )
}

fn testimonials() -> String {
    let quotes: String = TESTIMONIALS.iter().map(testimonial).collect();
    format!(
        "{}<h2>What people say</h2>{}</section>",
        section_open(Section::Testimonials, "testimonials"),
        quotes
    )
}

fn call_to_action() -> String {
    format!(
        "{}<h2>Ready to start learning?</h2>{}{}</section>",
        section_open(Section::CallToAction, "cta"),
        link(Navigation::Route(SIGNUP_ROUTE), "Create an account"),
        link(Navigation::Route(LOGIN_ROUTE), "I already have one"),
    )
}

fn footer() -> String {
    let social: String = SOCIAL_LINKS
        .iter()
        .map(|it| link(Navigation::External(it.url), it.label))
        .collect();
    format!(
        "<footer id=\"{}\"><p>&copy; {}</p><nav>{}</nav></footer>",
        Section::Footer.anchor_id(),
        escape(BRAND),
        social
    )
}

/// Renders the complete landing page for `view`.
pub fn page(view: &LandingView) -> String {
    [
        format!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
             <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\
             <title>{}</title><style>{}</style></head><body>",
            escape(BRAND),
            PAGE_STYLE
        ),
        header(),
        "<main>".to_string(),
        hero(),
        features(),
        flip_card(view),
        testimonials(),
        call_to_action(),
        "</main>".to_string(),
        footer(),
        format!("<script>{}</script></body></html>", PAGE_SCRIPT),
    ]
    .concat()
}
