pub mod canvas;
pub mod data;
pub mod font;
pub mod meeting;
pub mod occupancy;
pub mod render;
pub mod session;
pub mod time;
pub mod window;

pub use data::{validate_range, ValidationError, ValidationPolicy};
pub use meeting::{Availability, Meeting, UserId, Weekday};
pub use render::{compute_heatmap, RenderError, Renderer};
pub use session::{SessionError, SetupSession};
pub use time::{format_time, parse_time, round_to_quarter_hour, TimeOfDay, TimeRange};
pub use window::{compute_top_windows, OptimalWindow};

#[cfg(test)]
mod tests {
    use crate::meeting::{Availability, Weekday};
    use crate::time::TimeRange;

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::parse(start, end).unwrap()
    }

    fn availability(entries: &[(&str, Weekday, &str, &str)]) -> Availability {
        let mut availability = Availability::new();
        for &(user, day, start, end) in entries {
            availability
                .entry(user.to_string())
                .or_default()
                .entry(day)
                .or_default()
                .push(range(start, end));
        }
        availability
    }

    #[test]
    fn formats_every_minute_back_to_itself() {
        use crate::time::{format_time, parse_time, TimeOfDay};

        for minutes in 0..=1440 {
            let time = TimeOfDay::new(minutes).unwrap();
            assert_eq!(parse_time(&format_time(time)), Ok(time));
        }

        assert_eq!(format_time(TimeOfDay::END_OF_DAY), "24:00");
        assert_eq!(format_time(TimeOfDay::at(7, 5)), "07:05");
    }

    #[test]
    fn rejects_malformed_times() {
        use crate::data::ValidationError;
        use crate::time::parse_time;

        for bad in ["", "9", "09:5", "24:01", "25:00", "12:60", "ab:cd", "009:00", "09:00pm"] {
            assert!(
                matches!(parse_time(bad), Err(ValidationError::InvalidFormat(_))),
                "{:?} parsed",
                bad
            );
        }

        assert!(parse_time(" 9:30 ").is_ok());
    }

    #[test]
    fn rounding_is_idempotent_and_on_quarters() {
        use crate::time::{round_to_quarter_hour, TimeOfDay, QUARTER_HOUR};

        for minutes in 0..=1440 {
            let rounded = round_to_quarter_hour(TimeOfDay::new(minutes).unwrap());
            assert_eq!(round_to_quarter_hour(rounded), rounded);
            assert!(
                rounded.minutes() % QUARTER_HOUR == 0 || rounded.minutes() == 1439,
                "{} rounded to {}",
                minutes,
                rounded
            );
        }
    }

    #[test]
    fn overlap_is_symmetric_and_half_open() {
        let ranges = [
            range("00:00", "00:30"),
            range("00:30", "01:00"),
            range("00:15", "00:45"),
            range("09:00", "12:00"),
            TimeRange::all_day(),
        ];

        for a in &ranges {
            for b in &ranges {
                assert_eq!(a.overlaps(b), b.overlaps(a), "{} / {}", a, b);
            }
        }

        assert!(!ranges[0].overlaps(&ranges[1]));
        assert!(ranges[2].overlaps(&ranges[0]));
        assert!(ranges[4].overlaps(&ranges[3]));
    }

    #[test]
    fn validates_ranges() {
        use crate::data::{validate_range, ValidationError};

        assert!(matches!(
            validate_range(&range("09:00", "09:20"), &[], 30),
            Err(ValidationError::InvalidRange { .. })
        ));
        assert!(matches!(
            validate_range(&range("10:00", "09:00"), &[], 30),
            Err(ValidationError::InvalidRange { .. })
        ));
        assert!(validate_range(&TimeRange::all_day(), &[], 30).is_ok());

        let existing = vec![range("09:00", "12:00")];
        assert_eq!(
            validate_range(&range("11:00", "13:00"), &existing, 30),
            Err(ValidationError::OverlappingRange {
                range: range("11:00", "13:00"),
                existing: range("09:00", "12:00"),
            })
        );
        assert!(validate_range(&range("12:00", "13:00"), &existing, 30).is_ok());
    }

    #[test]
    fn meeting_is_untouched_by_rejected_availability() {
        use crate::data::{ValidationError, ValidationPolicy};
        use crate::meeting::Meeting;

        let policy = ValidationPolicy::default();
        let mut meeting = Meeting::new([Weekday::Monday], vec![range("09:00", "17:00")]);

        meeting
            .add_availability("u1", Weekday::Monday, range("09:00", "10:00"), &policy)
            .unwrap();
        let before = meeting.clone();

        assert!(matches!(
            meeting.add_availability("u1", Weekday::Monday, range("09:30", "11:00"), &policy),
            Err(ValidationError::OverlappingRange { .. })
        ));
        assert!(matches!(
            meeting.add_availability("u1", Weekday::Monday, range("13:00", "13:15"), &policy),
            Err(ValidationError::InvalidRange { .. })
        ));
        assert_eq!(meeting, before);

        // other users and other days are checked separately
        meeting
            .add_availability("u2", Weekday::Monday, range("09:30", "11:00"), &policy)
            .unwrap();
        meeting
            .add_availability("u1", Weekday::Tuesday, range("09:30", "11:00"), &policy)
            .unwrap();
        assert_eq!(meeting.respondents(), 2);
    }

    #[test]
    fn policy_reads_minimum_from_environment() {
        use crate::data::{ValidationPolicy, MIN_DURATION_VAR};

        std::env::set_var(MIN_DURATION_VAR, "15");
        assert_eq!(ValidationPolicy::from_env(), ValidationPolicy::new(15));

        std::env::set_var(MIN_DURATION_VAR, "soon");
        assert_eq!(ValidationPolicy::from_env(), ValidationPolicy::default());

        std::env::remove_var(MIN_DURATION_VAR);
    }

    #[test]
    fn timeline_marks_gaps_between_ranges() {
        use crate::occupancy::{timeline, Slot};

        let touching = timeline(&[range("09:00", "10:00"), range("10:00", "10:30")]);
        assert_eq!(touching.len(), 6);
        assert!(!touching.contains(&Slot::Gap));

        let apart = timeline(&[range("13:00", "13:30"), range("09:00", "09:30")]);
        assert_eq!(apart.len(), 5);
        assert_eq!(apart[2], Slot::Gap);
        assert!(matches!(
            apart[3],
            Slot::Tick { range: tick, first: true, .. } if tick == range("13:00", "13:15")
        ));
    }

    #[test]
    fn occupancy_without_users_is_empty_bucket() {
        use crate::occupancy::{compute_occupancy, Occupancy};

        let grid = compute_occupancy(
            &[Weekday::Friday, Weekday::Monday, Weekday::Friday],
            &[range("09:00", "10:00")],
            &Availability::new(),
        );

        assert_eq!(grid.days, vec![Weekday::Monday, Weekday::Friday]);
        assert_eq!(grid.rows.len(), 4);
        assert_eq!(grid.cell(0, 1), Some(Occupancy { count: 0, total: 0 }));
        assert_eq!(grid.cell(0, 1).unwrap().bucket(), 0);
        assert_eq!(grid.cell(0, 1).unwrap().ratio(), 0.0);
    }

    #[test]
    fn counts_users_per_slot() {
        use crate::occupancy::compute_occupancy;

        let availability = availability(&[
            ("u1", Weekday::Monday, "09:00", "10:00"),
            ("u2", Weekday::Monday, "09:30", "11:00"),
            ("u2", Weekday::Tuesday, "09:00", "09:15"),
        ]);
        let grid = compute_occupancy(
            &[Weekday::Monday, Weekday::Tuesday],
            &[range("09:00", "11:00")],
            &availability,
        );

        let counts: Vec<usize> = (0..grid.rows.len())
            .map(|row| grid.cell(row, 0).unwrap().count)
            .collect();
        assert_eq!(counts, vec![1, 1, 2, 2, 1, 1, 1, 1]);
        assert_eq!(grid.cell(0, 1).unwrap().count, 1);
        assert_eq!(grid.cell(1, 1).unwrap().count, 0);
        assert_eq!(grid.cell(2, 0).unwrap().bucket(), 10);
        assert_eq!(grid.cell(0, 0).unwrap().bucket(), 5);
    }

    #[test]
    fn finds_top_windows() {
        use crate::window::compute_top_windows;
        use std::collections::BTreeSet;

        let availability = availability(&[
            ("u1", Weekday::Monday, "09:00", "10:00"),
            ("u2", Weekday::Monday, "09:30", "11:00"),
        ]);
        let windows = compute_top_windows(&[Weekday::Monday], &[range("09:00", "11:00")], &availability, 4);

        assert_eq!(windows.len(), 3);

        assert_eq!(windows[0].range, range("09:30", "10:00"));
        assert_eq!(windows[0].attend_count(), 2);
        assert_eq!(windows[0].duration(), 30);
        assert!(windows[0].absent.is_empty());

        assert_eq!(windows[1].range, range("10:00", "11:00"));
        assert_eq!(windows[1].attending, BTreeSet::from(["u2".to_string()]));
        assert_eq!(windows[1].absent, BTreeSet::from(["u1".to_string()]));

        assert_eq!(windows[2].range, range("09:00", "09:30"));
        assert_eq!(windows[2].to_string(), "Monday 09:00–09:30 (1/2)");
    }

    #[test]
    fn top_windows_are_capped_and_ranked() {
        use crate::window::compute_top_windows;

        let availability = availability(&[
            ("a", Weekday::Monday, "09:00", "12:00"),
            ("b", Weekday::Monday, "10:00", "11:00"),
            ("c", Weekday::Wednesday, "09:00", "09:30"),
            ("a", Weekday::Wednesday, "13:00", "14:00"),
            ("b", Weekday::Friday, "09:00", "17:00"),
            ("c", Weekday::Friday, "11:00", "12:00"),
        ]);
        let days = [Weekday::Monday, Weekday::Wednesday, Weekday::Friday];
        let ranges = [range("09:00", "12:00"), range("13:00", "17:00")];

        let all = compute_top_windows(&days, &ranges, &availability, usize::MAX);
        let top = compute_top_windows(&days, &ranges, &availability, 4);

        assert_eq!(top.len(), 4);
        assert_eq!(&all[..4], &top[..]);
        for pair in all.windows(2) {
            assert_ne!(pair[0].rank(&pair[1]), std::cmp::Ordering::Greater);
        }

        assert!(compute_top_windows(&days, &ranges, &availability, 0).is_empty());
        assert!(compute_top_windows(&days, &ranges, &Availability::new(), 4).is_empty());
    }

    #[test]
    fn windows_do_not_cross_gaps() {
        use crate::window::compute_top_windows;

        let availability = availability(&[("u1", Weekday::Sunday, "09:00", "14:00")]);
        let windows = compute_top_windows(
            &[Weekday::Sunday],
            &[range("09:00", "10:00"), range("13:00", "14:00")],
            &availability,
            4,
        );

        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].range, range("09:00", "10:00"));
        assert_eq!(windows[1].range, range("13:00", "14:00"));
    }

    #[test]
    fn truncates_long_labels() {
        use crate::render::truncate_label;

        assert_eq!(truncate_label("thirteen_char", 13), "thirteen_char");
        assert_eq!(truncate_label("fourteen_chars", 13), "fourteen_c...");
        assert_eq!(truncate_label("fourteen_chars", 13).chars().count(), 13);
    }

    #[test]
    fn renders_placeholder_without_rows() {
        use crate::render::render;
        use image::Rgba;

        let availability = availability(&[("u1", Weekday::Monday, "09:00", "10:00")]);

        for image in [
            render(&[], &[range("09:00", "10:00")], &availability),
            render(&[Weekday::Monday], &[], &availability),
        ] {
            assert_eq!(image.dimensions(), (100, 100));
            assert!(image.pixels().all(|pixel| *pixel == Rgba([255, 255, 255, 255])));
        }
    }

    #[test]
    fn renders_cells_by_bucket() {
        use crate::render::{Palette, Renderer};

        let availability = availability(&[
            ("u1", Weekday::Monday, "09:00", "10:00"),
            ("u2", Weekday::Monday, "09:30", "11:00"),
        ]);
        let renderer = Renderer::default();
        let palette = Palette::default();
        let image = renderer.render(&[Weekday::Monday], &[range("09:00", "11:00")], &availability);

        let layout = &renderer.layout;
        assert_eq!(
            image.width(),
            layout.label_width + layout.cell_width + layout.gutter + layout.panel_width + layout.right_padding
        );

        let x = layout.label_width + layout.cell_width / 2;
        let row_center = |row: u32| layout.padding + row * layout.cell_height + layout.cell_height / 2;

        assert_eq!(*image.get_pixel(x, row_center(0)), palette.buckets[5]);
        assert_eq!(*image.get_pixel(x, row_center(2)), palette.buckets[10]);
    }

    #[test]
    fn renders_gap_rows() {
        use crate::render::{Palette, Renderer};

        let renderer = Renderer::default();
        let image = renderer.render(
            &[Weekday::Monday, Weekday::Tuesday],
            &[range("09:00", "09:30"), range("13:00", "13:30")],
            &Availability::new(),
        );

        let layout = &renderer.layout;
        let y = layout.padding + 2 * layout.cell_height + layout.cell_height / 2;
        let x = layout.label_width + layout.cell_width / 2;

        assert_eq!(*image.get_pixel(x, y), Palette::default().gap);
        assert_eq!(*image.get_pixel(x, layout.padding + layout.cell_height / 2), Palette::default().buckets[0]);
    }

    #[test]
    fn heatmap_is_deterministic() {
        use crate::render::compute_heatmap;

        let availability = availability(&[
            ("zed", Weekday::Thursday, "12:00", "15:00"),
            ("amy", Weekday::Tuesday, "08:00", "12:00"),
            ("amy", Weekday::Thursday, "13:00", "14:00"),
            ("bob", Weekday::Tuesday, "10:00", "11:30"),
        ]);
        let days = [Weekday::Thursday, Weekday::Tuesday];
        let ranges = [range("13:00", "15:00"), range("08:00", "12:00")];

        let first = compute_heatmap(&days, &ranges, &availability).unwrap();
        let second = compute_heatmap(&days, &ranges, &availability).unwrap();

        assert_eq!(&first[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(first, second);
    }

    #[test]
    fn wraps_user_lists_to_panel_width() {
        use crate::render::{PanelItem, Renderer};
        use crate::window::compute_top_windows;
        use std::collections::BTreeSet;

        let users: Vec<String> = (0..30).map(|i| format!("user{:02}", i)).collect();
        let entries: Vec<_> = users
            .iter()
            .map(|user| (user.as_str(), Weekday::Monday, "09:00", "10:00"))
            .collect();
        let availability = availability(&entries);

        let windows = compute_top_windows(&[Weekday::Monday], &[range("09:00", "10:00")], &availability, 4);
        assert_eq!(windows.len(), 1);

        let renderer = Renderer::default();
        let panel = renderer.layout_panel(&windows, availability.len());

        let mark_rows: BTreeSet<i64> = panel
            .items
            .iter()
            .filter_map(|item| match item {
                PanelItem::Mark { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(mark_rows.len(), 8);

        let max_x = i64::from(renderer.layout.panel_width - renderer.layout.panel_inset);
        assert!(panel.items.iter().all(|item| match item {
            PanelItem::Mark { x, .. } => *x < max_x,
            _ => true,
        }));
    }

    #[test]
    fn uses_display_names_in_panel() {
        use crate::render::{PanelItem, Renderer};
        use crate::window::compute_top_windows;
        use std::collections::BTreeMap;

        let availability = availability(&[("1234", Weekday::Monday, "09:00", "10:00")]);
        let windows = compute_top_windows(&[Weekday::Monday], &[range("09:00", "10:00")], &availability, 4);

        let renderer = Renderer::default().with_display_names(BTreeMap::from([(
            "1234".to_string(),
            "Bartholomew Jones".to_string(),
        )]));
        let panel = renderer.layout_panel(&windows, 1);

        assert!(panel.items.contains(&PanelItem::Text {
            x: 12 + 10 + 4,
            y: 12 + 20 + 20,
            text: "Bartholome...".to_string(),
        }));
        assert!(panel.height >= renderer.layout.min_panel_height);
    }

    #[test]
    fn session_walks_through_setup() {
        use crate::data::ValidationPolicy;
        use crate::session::{SessionError, SetupSession, Stage};

        let policy = ValidationPolicy::default();
        let mut session = SetupSession::new();

        assert_eq!(
            session.add_range("09:00", "10:00", &policy),
            Err(SessionError::WrongState {
                expected: Stage::AddingRanges,
                found: Stage::SelectingDays
            })
        );

        for day in Weekday::ALL {
            assert_eq!(session.toggle_day(day), Ok(false));
        }
        assert_eq!(session.confirm_days(), Err(SessionError::NoDaysSelected));
        assert_eq!(session.toggle_day(Weekday::Wednesday), Ok(true));
        session.confirm_days().unwrap();

        assert_eq!(session.finish_ranges(), Err(SessionError::NoRanges));
        assert!(matches!(
            session.add_range("9", "10:00", &policy),
            Err(SessionError::Invalid(_))
        ));
        assert_eq!(session.add_range("9:07", "10:08", &policy), Ok(range("09:00", "10:15")));
        session.finish_ranges().unwrap();

        assert_eq!(session.stage(), Stage::SettingDetails);
        assert!(session.meeting().is_none());
        session.set_details(Some("  ".to_string()), Some("weekly".to_string())).unwrap();

        let meeting = session.into_meeting().unwrap();
        assert_eq!(meeting.days(), vec![Weekday::Wednesday]);
        assert_eq!(meeting.title, None);
        assert_eq!(meeting.description.as_deref(), Some("weekly"));
    }

    #[test]
    fn timeline_skips_inverted_ranges() {
        use crate::occupancy::{timeline, Slot};

        let slots = timeline(&[range("09:00", "09:30"), range("11:00", "10:00")]);
        assert_eq!(slots.len(), 2);
        assert!(!slots.contains(&Slot::Gap));
        assert!(matches!(slots[1], Slot::Tick { last: true, .. }));

        assert!(timeline(&[range("11:00", "10:00")]).is_empty());
    }

    #[test]
    fn overlapping_candidates_share_ticks() {
        use crate::occupancy::ticks;
        use crate::window::compute_top_windows;

        let ranges = [range("09:00", "11:00"), range("10:00", "12:00")];
        assert_eq!(ticks(&ranges).len(), 12);

        let availability = availability(&[("u1", Weekday::Monday, "09:00", "12:00")]);
        let windows = compute_top_windows(&[Weekday::Monday], &ranges, &availability, 4);

        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].range, range("09:00", "12:00"));
    }

    #[test]
    fn labels_range_edges_and_half_hours() {
        use crate::font::text_height;
        use crate::render::{Palette, Renderer};

        let renderer = Renderer::default();
        let text = Palette::default().text;
        let image = renderer.render(&[Weekday::Monday], &[range("09:15", "10:15")], &Availability::new());

        let layout = &renderer.layout;
        let half_text = text_height(layout.text_scale) / 2;
        let labelled = |row: u32| {
            let top = layout.padding + row * layout.cell_height;
            (top - half_text..top + half_text)
                .any(|y| (0..layout.label_width).any(|x| *image.get_pixel(x, y) == text))
        };

        assert!(labelled(0), "09:15 starts the range");
        assert!(labelled(1), "09:30 is on the half hour");
        assert!(!labelled(2), "09:45 is unlabelled");
        assert!(labelled(3), "10:00 is on the hour");
        assert!(labelled(4), "10:15 ends the range");
    }

    #[test]
    fn meeting_summaries_match_free_functions() {
        use crate::meeting::Meeting;
        use crate::render::{compute_heatmap, Renderer};
        use crate::window::compute_top_windows;

        let mut meeting = Meeting::new([Weekday::Tuesday, Weekday::Monday], vec![range("09:00", "11:00")]);
        meeting.user_availability = availability(&[
            ("u1", Weekday::Monday, "09:00", "10:00"),
            ("u2", Weekday::Monday, "09:30", "11:00"),
            ("u2", Weekday::Tuesday, "10:00", "11:00"),
        ]);

        let days = meeting.days();
        assert_eq!(days, vec![Weekday::Monday, Weekday::Tuesday]);

        let windows = meeting.top_windows(4);
        assert_eq!(
            windows,
            compute_top_windows(&days, &meeting.ranges, &meeting.user_availability, 4)
        );
        assert_eq!(windows[0].range, range("09:30", "10:00"));

        let png = compute_heatmap(&days, &meeting.ranges, &meeting.user_availability).unwrap();
        assert_eq!(meeting.heatmap().unwrap(), png);
        assert_eq!(
            Renderer::default()
                .render_png(&days, &meeting.ranges, &meeting.user_availability)
                .unwrap(),
            png
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn reads_stored_meetings() {
        use crate::meeting::Meeting;

        let stored = r#"{
            "selectedDays": ["Monday", "Wednesday"],
            "ranges": [{ "start": "09:00", "end": "12:00" }],
            "userAvailability": {
                "1234": { "Monday": [["09:00", "10:00"], ["11:00", "12:00"]] }
            },
            "embedTitle": "Planning"
        }"#;

        let meeting: Meeting = serde_json::from_str(stored).unwrap();
        assert_eq!(meeting.days(), vec![Weekday::Monday, Weekday::Wednesday]);
        assert_eq!(meeting.ranges, vec![range("09:00", "12:00")]);
        assert_eq!(meeting.user_availability["1234"][&Weekday::Monday].len(), 2);
        assert_eq!(meeting.title.as_deref(), Some("Planning"));
        assert_eq!(meeting.description, None);

        let written = serde_json::to_string(&meeting).unwrap();
        assert_eq!(serde_json::from_str::<Meeting>(&written).unwrap(), meeting);
    }
}
