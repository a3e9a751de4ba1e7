//! Static promotional copy shown on the landing page.

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Feature {
    pub icon: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Testimonial {
    pub name: &'static str,
    pub role: &'static str,
    pub avatar_url: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SocialLink {
    pub label: &'static str,
    pub url: &'static str,
}

pub const BRAND: &str = "LessonHub";
pub const TAGLINE: &str = "Live lessons in Indian Sign Language, Mathematics and Science.";

/// Image on the front of the flip card.
pub const CARD_ICON_URL: &str = "https://cdn-icons-png.flaticon.com/512/3135/3135755.png";

pub const FEATURES: [Feature; 4] = [
    Feature {
        icon: "calendar",
        title: "Scheduled Lessons",
        description: "Teachers plan sessions ahead and students always know what comes next.",
    },
    Feature {
        icon: "hands",
        title: "Sign Language First",
        description: "ISL lessons built with and for the deaf and hard of hearing community.",
    },
    Feature {
        icon: "video",
        title: "Live Classrooms",
        description: "Join a lesson the moment it goes live and follow along in real time.",
    },
    Feature {
        icon: "chart",
        title: "Progress Tracking",
        description: "See which lessons are upcoming, in progress and completed at a glance.",
    },
];

pub const TESTIMONIALS: [Testimonial; 3] = [
    Testimonial {
        name: "Ananya Rao",
        role: "ISL Teacher",
        avatar_url: "https://randomuser.me/api/portraits/women/44.jpg",
        text: "Scheduling my weekly classes takes minutes and my students never miss a session.",
    },
    Testimonial {
        name: "Rahul Mehta",
        role: "Student",
        avatar_url: "https://randomuser.me/api/portraits/men/32.jpg",
        text: "Learning maths alongside sign language finally made both of them click for me.",
    },
    Testimonial {
        name: "Priya Nair",
        role: "Parent",
        avatar_url: "https://randomuser.me/api/portraits/women/68.jpg",
        text: "I can see what my daughter is learning every week without chasing anyone.",
    },
];

pub const SOCIAL_LINKS: [SocialLink; 3] = [
    SocialLink {
        label: "Twitter",
        url: "https://twitter.com",
    },
    SocialLink {
        label: "Facebook",
        url: "https://facebook.com",
    },
    SocialLink {
        label: "Instagram",
        url: "https://instagram.com",
    },
];
