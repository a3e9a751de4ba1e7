//! Interaction state of the marketing landing page.
//!
//! The page itself is static; the only state it carries is whether the icon
//! card is flipped. Scrolling is an imperative action on a [`Viewport`] and
//! entrance animations are tracked by [`RevealTracker`].

use std::collections::HashSet;

pub mod content;
pub mod render;

use content::SOCIAL_LINKS;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Section {
    Hero,
    Features,
    FlipCard,
    Testimonials,
    CallToAction,
    Footer,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Hero,
        Section::Features,
        Section::FlipCard,
        Section::Testimonials,
        Section::CallToAction,
        Section::Footer,
    ];

    /// Element id of the section on the rendered page.
    pub fn anchor_id(self) -> &'static str {
        match self {
            Section::Hero => "about",
            Section::Features => "features",
            Section::FlipCard => "flip-card",
            Section::Testimonials => "testimonials",
            Section::CallToAction => "get-started",
            Section::Footer => "footer",
        }
    }

    /// Whether the section plays an entrance animation.
    pub fn animates(self) -> bool {
        !matches!(self, Section::Hero | Section::Footer)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

/// Page surface the view scrolls.
pub trait Viewport {
    /// Whether `section` is currently mounted.
    fn contains(&self, section: Section) -> bool;

    fn scroll_into_view(&mut self, section: Section, behavior: ScrollBehavior);

    fn scroll_to_top(&mut self, behavior: ScrollBehavior);
}

/// Navigation handed to the router.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Navigation {
    Route(&'static str),
    /// Opens in a new browsing context.
    External(&'static str),
}

impl Navigation {
    pub fn href(self) -> &'static str {
        match self {
            Navigation::Route(path) | Navigation::External(path) => path,
        }
    }

    pub fn opens_new_context(self) -> bool {
        matches!(self, Navigation::External(_))
    }
}

pub const LOGIN_ROUTE: &str = "/login";
pub const SIGNUP_ROUTE: &str = "/signup";
pub const HOME_ROUTE: &str = "/";

/// Everything on the page a visitor can activate.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Affordance {
    Home,
    Login,
    Signup,
    /// In-page `#about` link. Scrolls to the top instead of navigating.
    About,
    GetStarted,
    FlipCard,
    /// Index into [`SOCIAL_LINKS`].
    Social(usize),
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LandingView {
    card_flipped: bool,
}

impl LandingView {
    pub fn new(card_flipped: bool) -> LandingView {
        LandingView { card_flipped }
    }

    pub fn card_flipped(&self) -> bool {
        self.card_flipped
    }

    pub fn flip_card(&mut self) -> bool {
        self.card_flipped = !self.card_flipped;
        self.card_flipped
    }

    /// Brings the call to action into view. Does nothing when the section
    /// isn't mounted.
    pub fn get_started(&self, viewport: &mut impl Viewport) {
        if viewport.contains(Section::CallToAction) {
            viewport.scroll_into_view(Section::CallToAction, ScrollBehavior::Smooth);
        } else {
            tracing::trace!("call to action isn't mounted, not scrolling");
        }
    }

    /// Handles a click on `affordance` and returns where to navigate, if
    /// anywhere.
    pub fn activate(
        &mut self,
        affordance: Affordance,
        viewport: &mut impl Viewport,
    ) -> Option<Navigation> {
        match affordance {
            Affordance::Home => Some(Navigation::Route(HOME_ROUTE)),
            Affordance::Login => Some(Navigation::Route(LOGIN_ROUTE)),
            Affordance::Signup => Some(Navigation::Route(SIGNUP_ROUTE)),
            Affordance::About => {
                viewport.scroll_to_top(ScrollBehavior::Smooth);
                None
            }
            Affordance::GetStarted => {
                self.get_started(viewport);
                None
            }
            Affordance::FlipCard => {
                self.flip_card();
                None
            }
            Affordance::Social(index) => SOCIAL_LINKS
                .get(index)
                .map(|link| Navigation::External(link.url)),
        }
    }
}

/// Remembers which sections already played their entrance animation.
#[derive(Debug, Clone, Default)]
pub struct RevealTracker {
    revealed: HashSet<Section>,
}

impl RevealTracker {
    /// Returns `true` only the first time an animated `section` enters the
    /// viewport.
    pub fn enter(&mut self, section: Section) -> bool {
        section.animates() && self.revealed.insert(section)
    }

    pub fn is_revealed(&self, section: Section) -> bool {
        !section.animates() || self.revealed.contains(&section)
    }
}
