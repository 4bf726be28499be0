use super::{Area, Category, Subcategory};

/// Bump whenever ids, codes or names in the tree change.
pub const FRAMEWORK_VERSION: &str = "2024.1";

macro_rules! category {
    ($area:literal, $number:literal, $name:literal, [ $( $code:literal => $sub:literal ),+ $(,)? ]) => {
        Category {
            id: concat!($area, ".", $number),
            number: $number,
            name: $name,
            subcategories: &[
                $( Subcategory { id: concat!($area, ".", $code), code: $code, name: $sub } ),+
            ],
        }
    };
}

pub(super) static AREAS: &[Area] = &[
    Area {
        id: "communication",
        number: 1,
        name: "Communication and Interaction",
        description: "Understanding and using verbal and non-verbal communication to interact with others.",
        color: "blue",
        categories: &[
            category!("communication", 1, "Expressive communication", [
                "1.1" => "Requesting wants and needs",
                "1.2" => "Commenting and sharing information",
                "1.3" => "Asking questions",
                "1.4" => "Expressing feelings and opinions",
            ]),
            category!("communication", 2, "Receptive communication", [
                "2.1" => "Responding to own name",
                "2.2" => "Following instructions",
                "2.3" => "Understanding questions",
                "2.4" => "Understanding non-literal language",
            ]),
            category!("communication", 3, "Interaction", [
                "3.1" => "Shared attention",
                "3.2" => "Turn-taking in conversation",
                "3.3" => "Initiating interaction",
                "3.4" => "Maintaining a conversation",
            ]),
        ],
    },
    Area {
        id: "social",
        number: 2,
        name: "Social Understanding and Relationships",
        description: "Understanding social situations and building relationships with adults and peers.",
        color: "purple",
        categories: &[
            category!("social", 1, "Social awareness", [
                "1.1" => "Awareness of others",
                "1.2" => "Understanding others' perspectives",
                "1.3" => "Understanding social rules and expectations",
            ]),
            category!("social", 2, "Relationships", [
                "2.1" => "Interacting with familiar adults",
                "2.2" => "Playing alongside and with peers",
                "2.3" => "Forming and keeping friendships",
            ]),
            category!("social", 3, "Group participation", [
                "3.1" => "Taking part in small group activities",
                "3.2" => "Sharing and cooperating",
                "3.3" => "Managing disagreements",
            ]),
        ],
    },
    Area {
        id: "sensory",
        number: 3,
        name: "Sensory Processing",
        description: "Recognising and managing responses to sensory input across environments.",
        color: "teal",
        categories: &[
            category!("sensory", 1, "Sensory awareness", [
                "1.1" => "Recognising own sensory preferences",
                "1.2" => "Tolerating everyday sensory input",
                "1.3" => "Communicating sensory needs",
            ]),
            category!("sensory", 2, "Sensory regulation", [
                "2.1" => "Using sensory tools and strategies",
                "2.2" => "Requesting and using sensory breaks",
                "2.3" => "Managing busy or unfamiliar environments",
            ]),
            category!("sensory", 3, "Body awareness", [
                "3.1" => "Movement and coordination",
                "3.2" => "Recognising body signals",
            ]),
        ],
    },
    Area {
        id: "interests",
        number: 4,
        name: "Interests, Routines and Processing",
        description: "Using interests positively, coping with change, and processing information flexibly.",
        color: "orange",
        categories: &[
            category!("interests", 1, "Interests", [
                "1.1" => "Developing and sharing interests",
                "1.2" => "Broadening interests",
                "1.3" => "Using interests to support learning",
            ]),
            category!("interests", 2, "Routines and change", [
                "2.1" => "Following routines",
                "2.2" => "Coping with changes to routine",
                "2.3" => "Managing transitions",
            ]),
            category!("interests", 3, "Processing", [
                "3.1" => "Using processing time",
                "3.2" => "Flexible thinking",
                "3.3" => "Problem solving",
            ]),
        ],
    },
    Area {
        id: "emotional",
        number: 5,
        name: "Emotional Understanding and Self-awareness",
        description: "Understanding and regulating emotions, and developing a positive sense of self.",
        color: "red",
        categories: &[
            category!("emotional", 1, "Emotional understanding", [
                "1.1" => "Recognising own emotions",
                "1.2" => "Recognising emotions in others",
                "1.3" => "Understanding causes of emotions",
            ]),
            category!("emotional", 2, "Emotional regulation", [
                "2.1" => "Using calming strategies",
                "2.2" => "Seeking help when distressed",
                "2.3" => "Recovering after distress",
            ]),
            category!("emotional", 3, "Self-awareness", [
                "3.1" => "Understanding own strengths and difficulties",
                "3.2" => "Understanding own autism",
                "3.3" => "Self-advocacy",
            ]),
        ],
    },
    Area {
        id: "learning",
        number: 6,
        name: "Learning and Engagement",
        description: "Engaging with learning activities and developing independent learning skills.",
        color: "green",
        categories: &[
            category!("learning", 1, "Engagement", [
                "1.1" => "Attending to adult-led activities",
                "1.2" => "Sustaining attention",
                "1.3" => "Engaging with new tasks",
            ]),
            category!("learning", 2, "Independent learning", [
                "2.1" => "Working independently",
                "2.2" => "Organising materials",
                "2.3" => "Using visual supports",
            ]),
            category!("learning", 3, "Learning skills", [
                "3.1" => "Generalising skills",
                "3.2" => "Accepting help and feedback",
                "3.3" => "Making choices",
            ]),
        ],
    },
    Area {
        id: "healthy-living",
        number: 7,
        name: "Healthy Living",
        description: "Eating, personal care, physical activity and looking after own wellbeing.",
        color: "yellow",
        categories: &[
            category!("healthy-living", 1, "Eating and drinking", [
                "1.1" => "Trying new foods",
                "1.2" => "Mealtime routines",
            ]),
            category!("healthy-living", 2, "Personal care", [
                "2.1" => "Toileting",
                "2.2" => "Dressing",
                "2.3" => "Personal hygiene",
            ]),
            category!("healthy-living", 3, "Physical wellbeing", [
                "3.1" => "Physical activity",
                "3.2" => "Sleep routines",
                "3.3" => "Recognising illness and pain",
            ]),
        ],
    },
    Area {
        id: "independence",
        number: 8,
        name: "Independence and Community Participation",
        description: "Daily living skills, safety, and taking part in community life.",
        color: "indigo",
        categories: &[
            category!("independence", 1, "Daily living", [
                "1.1" => "Managing own belongings",
                "1.2" => "Using money",
                "1.3" => "Preparing simple food and drinks",
            ]),
            category!("independence", 2, "Community", [
                "2.1" => "Safety awareness",
                "2.2" => "Using community facilities",
                "2.3" => "Travelling in the community",
            ]),
            category!("independence", 3, "Preparing for the future", [
                "3.1" => "Making decisions",
                "3.2" => "Planning own time",
                "3.3" => "Preparing for adulthood",
            ]),
        ],
    },
];
