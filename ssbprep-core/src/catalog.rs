//! Built-in content: the seed catalog written at first migration, the study library,
//! and the fallback payloads substituted when the AI provider cannot be used.

use crate::types::{BriefingItem, Difficulty, Scenario, Topic};

/// GPE scenarios inserted into the `scenarios` table on first run.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            id: "gpe-flood-village".into(),
            title: "Flash Flood at Rampur".into(),
            narrative: "You are a group of six college students returning from a trek near \
                Rampur village at 1400 hrs. Heavy overnight rain has breached the canal \
                embankment 3 km north of the village and water is rising near the primary \
                school, where 40 children are attending a function. The only bridge on the \
                road to the district hospital (18 km) has a crack and a truck is stranded \
                on it. The village headman's son has been bitten by a snake near the temple \
                and needs anti-venom within two hours. Your group has one jeep with half a \
                tank of fuel, two bicycles and a mobile phone with a weak signal. The \
                nearest police post is 6 km east across the fields."
                .into(),
            difficulty: Difficulty::Medium,
            image_ref: Some("maps/rampur.png".into()),
        },
        Scenario {
            id: "gpe-forest-fire".into(),
            title: "Fire on the Ridge".into(),
            narrative: "Your group of five NCC cadets is camping near a forest rest house. \
                At 1700 hrs you notice smoke rising from the pine forest on the ridge \
                2 km away, with wind blowing towards a tribal hamlet of 30 huts. A \
                foreign tourist couple has gone missing on the ridge trail since noon. \
                The rest-house caretaker reports that the wireless set is out of order \
                and the forest guard post is 9 km away by a jeepable track. You have a \
                motorcycle, first-aid kit, three water cans and two axes."
                .into(),
            difficulty: Difficulty::Hard,
            image_ref: Some("maps/ridge.png".into()),
        },
        Scenario {
            id: "gpe-railway-halt".into(),
            title: "Trouble at the Railway Halt".into(),
            narrative: "You are four friends waiting at a small railway halt at 1900 hrs. \
                You overhear two men planning to place an obstruction on the track before \
                the 2130 hrs express passes. Simultaneously an elderly passenger collapses \
                on the platform with chest pain. The station master's phone line is dead, \
                the nearest town is 7 km away and you have two bicycles and a torch."
                .into(),
            difficulty: Difficulty::Easy,
            image_ref: None,
        },
    ]
}

/// Lecturette topics inserted into the `topics` table on first run.
pub fn default_topics() -> Vec<Topic> {
    let rows: [(&str, &str, &str, Difficulty); 8] = [
        ("lec-cyber-warfare", "Cyber Warfare and National Security", "Defence", Difficulty::Hard),
        ("lec-women-armed-forces", "Women in the Armed Forces", "Society", Difficulty::Medium),
        ("lec-space-program", "India's Space Programme", "Science", Difficulty::Medium),
        (
            "lec-climate-change",
            "Climate Change and Border Security",
            "Environment",
            Difficulty::Hard,
        ),
        ("lec-sports-youth", "Role of Sports in Youth Development", "Sports", Difficulty::Easy),
        ("lec-digital-india", "Digital India: Promise and Pitfalls", "Economy", Difficulty::Medium),
        ("lec-disaster-mgmt", "Disaster Management in India", "Governance", Difficulty::Easy),
        (
            "lec-indian-ocean",
            "Strategic Importance of the Indian Ocean",
            "Geopolitics",
            Difficulty::Hard,
        ),
    ];
    rows.into_iter()
        .map(|(id, title, category, difficulty)| Topic {
            id: id.into(),
            title: title.into(),
            category: category.into(),
            difficulty,
        })
        .collect()
}

/// Shown when the daily briefing cannot be generated. Never written to the cache.
pub fn fallback_briefing() -> Vec<BriefingItem> {
    vec![
        BriefingItem {
            title: "Read today's national newspaper".into(),
            category: "Habit".into(),
            summary: "Skim the front page, editorial and international pages of one national \
                daily and note three stories you could speak on for two minutes."
                .into(),
            relevance: Some("Interviewing officers expect awareness of recent events.".into()),
        },
        BriefingItem {
            title: "Track defence acquisitions".into(),
            category: "Defence".into(),
            summary: "Follow announcements from the Defence Acquisition Council and note the \
                platforms, the service that benefits and the indigenous content involved."
                .into(),
            relevance: None,
        },
        BriefingItem {
            title: "Know your neighbourhood".into(),
            category: "Geopolitics".into(),
            summary: "Revise the current state of relations with each neighbouring country and \
                one recent development for each of them."
                .into(),
            relevance: Some("Common group discussion and interview material.".into()),
        },
    ]
}

/// Scene descriptions used when the PPDT picture cannot be generated.
pub const FALLBACK_PPDT_PICTURES: &[&str] = &[
    "A hazy scene near a village well at dusk. Two figures stand close together, one \
     pointing towards a cart with a broken wheel; a third figure sits on the ground \
     holding what may be a bag.",
    "A blurred riverside at early morning. A small boat is tied to a post, one person \
     is stepping out with a box while another on the bank holds a rope. Clouds gather \
     in the background.",
    "An indistinct room with a table near a window. One person is seated with papers \
     in front, another stands at the door with a hand raised; light falls from outside.",
];

/// Kind of entry in the study library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Guide,
    Checklist,
    Reference,
}

impl ResourceKind {
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Guide => "Guide",
            ResourceKind::Checklist => "Checklist",
            ResourceKind::Reference => "Reference",
        }
    }
}

/// One entry in the study library.
#[derive(Debug, Clone, Copy)]
pub struct Resource {
    pub title: &'static str,
    pub kind: ResourceKind,
    pub summary: &'static str,
    pub body: &'static str,
}

/// The built-in study library.
pub const LIBRARY: &[Resource] = &[
    Resource {
        title: "The 15 Officer Like Qualities",
        kind: ResourceKind::Reference,
        summary: "What assessors look for across every test.",
        body: "Effective Intelligence, Reasoning Ability, Organising Ability, Power of \
               Expression, Social Adaptability, Cooperation, Sense of Responsibility, \
               Initiative, Self Confidence, Speed of Decision, Ability to Influence the \
               Group, Liveliness, Determination, Courage, Stamina.\n\nThey group into four \
               factors: planning and organising, social adjustment, social effectiveness \
               and dynamic.",
    },
    Resource {
        title: "GPE: Working Out a Plan",
        kind: ResourceKind::Guide,
        summary: "Prioritise problems, allot resources, write the plan.",
        body: "1. List every problem with its time and distance.\n2. Rank by threat to \
               life, then property.\n3. Match resources to problems, checking fuel, speed \
               and distances.\n4. Split the group; every member must have a task.\n5. \
               Write the plan in simple, time-stamped steps and finish with a fallback.",
    },
    Resource {
        title: "Lecturette Structure",
        kind: ResourceKind::Guide,
        summary: "Three minutes: opening, three points, conclusion.",
        body: "Opening (20 s): define the topic and why it matters.\nBody (2 min): three \
               points, each with one fact or example.\nConclusion (30 s): a balanced \
               view and a forward-looking line. Keep eye contact and speak at a steady \
               pace.",
    },
    Resource {
        title: "PPDT Story Checklist",
        kind: ResourceKind::Checklist,
        summary: "Hero, past, present, future, positive outcome.",
        body: "- Identify the number, gender, age and mood of characters.\n- Give the hero \
               a clear action and motive.\n- Cover what led up to the scene, what is \
               happening and the outcome.\n- Keep it realistic and positive.\n- Narrate \
               within one minute in a confident voice.",
    },
    Resource {
        title: "OIR Practice Tips",
        kind: ResourceKind::Guide,
        summary: "Speed first, accuracy second, no blank answers.",
        body: "Verbal and non-verbal reasoning sets come back to back. Budget about 30 \
               seconds per question, skip and return to hard ones, and revise series, \
               coding-decoding, analogies and odd-one-out patterns.",
    },
    Resource {
        title: "Current Affairs Routine",
        kind: ResourceKind::Checklist,
        summary: "Fifteen minutes a day beats a weekend cram.",
        body: "- Read one national daily.\n- Note one defence, one economy and one \
               international story.\n- Form an opinion on each in two sentences.\n- \
               Revise the week's notes every Sunday.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_ids_are_unique() {
        let mut ids: Vec<String> = default_scenarios().into_iter().map(|s| s.id).collect();
        ids.extend(default_topics().into_iter().map(|t| t.id));
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn fallback_briefing_passes_quality_rules() {
        for item in fallback_briefing() {
            assert!(crate::briefing::summary_is_usable(&item.summary), "{}", item.title);
        }
    }
}
