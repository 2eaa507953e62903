//! In-memory sample data: a small song library and a Sunday service built
//! from it. The application starts from this program; nothing is saved.

use crate::models::{element, header, Arrangement, HeaderColor, ItemPayload, ProgramItem, SongRef};
use crate::program::ProgramSequence;

fn song(
    song_id: i64,
    title: &str,
    author: &str,
    link: &str,
    length_minutes: u32,
    arrangements: Vec<Arrangement>,
) -> SongRef {
    SongRef {
        song_id,
        title: title.to_string(),
        author: author.to_string(),
        link: link.to_string(),
        length_minutes,
        arrangements,
    }
}

/// Songs the planner can add to a program.
pub fn song_library() -> Vec<SongRef> {
    vec![
        song(
            1,
            "Come Thou Fount",
            "Robert Robinson",
            "https://hymnary.org/text/come_thou_fount_of_every_blessing",
            4,
            vec![
                Arrangement::new("Traditional", &["D", "Eb"]),
                Arrangement::new("Acoustic", &["C", "D"]),
            ],
        ),
        song(
            2,
            "Be Thou My Vision",
            "Irish traditional",
            "https://hymnary.org/text/be_thou_my_vision_o_lord_of_my_heart",
            4,
            vec![Arrangement::new("Hymnal", &["Eb", "D"])],
        ),
        song(
            3,
            "It Is Well",
            "Horatio Spafford",
            "",
            5,
            vec![
                Arrangement::new("Hymnal", &["C", "Db"]),
                Arrangement::new("Choir SATB", &["C"]),
            ],
        ),
        song(
            4,
            "Great Is Thy Faithfulness",
            "Thomas Chisholm",
            "https://hymnary.org/text/great_is_thy_faithfulness_o_god_my_fathe",
            4,
            vec![Arrangement::new("Hymnal", &["D", "Eb", "E"])],
        ),
        song(
            5,
            "Doxology",
            "Thomas Ken",
            "",
            1,
            vec![Arrangement::new("Old Hundredth", &["G", "A"])],
        ),
    ]
}

/// A typical Sunday running order.
pub fn sample_program() -> ProgramSequence {
    let library = song_library();
    let song_at = |index: usize| ItemPayload::Song(library[index].clone());

    let payloads = vec![
        element("Welcome", "Announcements and greeting", "10:00", 5),
        header("Worship", HeaderColor::Blue),
        song_at(0),
        song_at(1),
        element("Prayer", "Pastoral prayer", "10:15", 5),
        header("Word", HeaderColor::Green),
        element("Sermon", "Romans 8", "10:20", 30),
        song_at(2),
        element("Offering", "", "10:55", 5),
        song_at(4),
    ];

    ProgramSequence::from_items(payloads.into_iter().map(ProgramItem::new))
}
