//! Demo data for a fresh database.

use aet_core::ProgressionLevel;
use aet_core::model::{ClassDraft, StudentDraft, StudentProfile};
use anyhow::Context;
use chrono::NaiveDate;
use services::AppServices;
use tracing::info;

const DEMO_CLASS: &str = "Demo Class";

struct DemoStudent {
    name: &'static str,
    born: (i32, u32, u32),
    interests: &'static str,
    sensory_needs: &'static str,
    communication_style: &'static str,
    progress: &'static [(&'static str, ProgressionLevel, bool)],
}

const STUDENTS: &[DemoStudent] = &[
    DemoStudent {
        name: "Alex Morgan",
        born: (2016, 4, 12),
        interests: "trains, timetables",
        sensory_needs: "ear defenders in assembly",
        communication_style: "verbal, prefers short instructions",
        progress: &[
            ("communication.1.1", ProgressionLevel::Established, false),
            ("communication.2.2", ProgressionLevel::Developing, false),
            ("social.1.1", ProgressionLevel::Developing, false),
        ],
    },
    DemoStudent {
        name: "Sam Patel",
        born: (2015, 11, 3),
        interests: "dinosaurs, drawing",
        sensory_needs: "seeks movement breaks",
        communication_style: "uses a communication book",
        progress: &[
            ("communication.1.1", ProgressionLevel::Generalised, true),
            ("sensory.1.1", ProgressionLevel::Developing, false),
        ],
    },
    DemoStudent {
        name: "Jordan Lee",
        born: (2016, 8, 27),
        interests: "music, water play",
        sensory_needs: "avoids bright lights",
        communication_style: "single words and signing",
        progress: &[("emotional.1.1", ProgressionLevel::Developing, false)],
    },
];

/// Create the demo class unless it already exists.
pub async fn run(services: &AppServices) -> anyhow::Result<()> {
    let classes = services.classes().list().await?;
    if let Some(existing) = classes.iter().find(|c| c.name() == DEMO_CLASS) {
        info!(class = %existing.id(), "demo class already present, nothing to seed");
        return Ok(());
    }

    let class = services
        .classes()
        .create(ClassDraft {
            name: DEMO_CLASS.into(),
            description: Some("Small group for key stage 2 pupils".into()),
            age_min: Some(7),
            age_max: Some(10),
        })
        .await?;

    for demo in STUDENTS {
        let (y, m, d) = demo.born;
        let student = services
            .students()
            .create(StudentDraft {
                class_id: Some(class.id()),
                name: demo.name.into(),
                date_of_birth: NaiveDate::from_ymd_opt(y, m, d),
                profile: StudentProfile {
                    interests: Some(demo.interests.into()),
                    sensory_needs: Some(demo.sensory_needs.into()),
                    communication_style: Some(demo.communication_style.into()),
                    ..StudentProfile::default()
                },
            })
            .await
            .with_context(|| format!("creating student {}", demo.name))?;

        for &(sub, level, completed) in demo.progress {
            services
                .progress()
                .set_level(student.id(), sub, level)
                .await
                .with_context(|| format!("seeding {sub} for {}", demo.name))?;
            if completed {
                services.progress().toggle_completed(student.id(), sub).await?;
            }
        }
    }

    info!(class = %class.id(), students = STUDENTS.len(), "demo data created");
    Ok(())
}
