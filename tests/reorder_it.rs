// crates.io
use rand::{SeedableRng, rngs::StdRng};
// self
use playlist_sorter::reorder::{
	ReorderMode, ShuffleConfig, ShuffleWeight, SmartSeparation, SortRuleError, Track,
	decode_rules, encode_rules, separate, shuffle_tracks_with, sort_tracks,
};

fn titles(tracks: &[Track]) -> Vec<&str> {
	tracks.iter().map(|track| track.name.as_str()).collect()
}

fn ids(tracks: &[Track]) -> Vec<String> {
	tracks.iter().map(|track| track.id.clone()).collect()
}

fn population() -> Vec<Track> {
	(0..100)
		.map(|i| {
			let popularity = if i % 2 == 0 { 90 } else { 10 };

			Track::new(format!("t{i}"), format!("Song {i}")).with_popularity(popularity)
		})
		.collect()
}

fn popular_in_top_twenty(weight: ShuffleWeight) -> f64 {
	const TRIALS: usize = 200;

	let tracks = population();
	let config = ShuffleConfig { weighted: weight, smart: SmartSeparation::default() };
	let mut rng = StdRng::seed_from_u64(0x5EED);
	let total = (0..TRIALS)
		.map(|_| {
			shuffle_tracks_with(&tracks, &config, &mut rng)
				.iter()
				.take(20)
				.filter(|track| track.popularity == Some(90))
				.count()
		})
		.sum::<usize>();

	total as f64 / TRIALS as f64
}

#[test]
fn title_sort_orders_and_reports_change() {
	let rules = decode_rules("title").expect("Single-key rules should decode.");
	let mut tracks =
		vec![Track::new("z", "Zebra"), Track::new("m", "Mango"), Track::new("a", "Apple")];

	assert!(sort_tracks(&mut tracks, &rules));
	assert_eq!(titles(&tracks), ["Apple", "Mango", "Zebra"]);
	assert!(!sort_tracks(&mut tracks, &rules));
}

#[test]
fn multi_rule_sort_breaks_ties_in_rule_order() {
	let rules = decode_rules("artist release_date/desc track_number")
		.expect("Multi-key rules should decode.");
	let mut tracks = vec![
		Track::new("1", "Old B").with_artist("Beck").with_release_date("1994").with_position(1, 2),
		Track::new("2", "New").with_artist("beck").with_release_date("2002-09").with_position(1, 1),
		Track::new("3", "Old A").with_artist("Beck").with_release_date("1994").with_position(1, 1),
		Track::new("4", "Intro").with_artist("Air").with_release_date("1998"),
		Track::new("5", "Untitled"),
	];

	assert!(sort_tracks(&mut tracks, &rules));
	assert_eq!(titles(&tracks), ["Untitled", "Intro", "New", "Old A", "Old B"]);
}

#[test]
fn accented_names_sort_with_their_base_letters() {
	let rules = decode_rules("artist").expect("Artist rule should decode.");
	let mut tracks = vec![
		Track::new("1", "x").with_artist("Zaz"),
		Track::new("2", "y").with_artist("Édith Piaf"),
		Track::new("3", "z").with_artist("Daft Punk"),
	];

	sort_tracks(&mut tracks, &rules);

	assert_eq!(
		tracks.iter().map(Track::artist).collect::<Vec<_>>(),
		["Daft Punk", "Édith Piaf", "Zaz"]
	);
}

#[test]
fn rule_strings_round_trip_and_reject_garbage() {
	let raw = "artist album/desc disc_number track_number/desc";
	let rules = decode_rules(raw).expect("Well-formed rules should decode.");

	assert_eq!(rules.len(), 4);
	assert_eq!(encode_rules(&rules), raw);
	assert_eq!(decode_rules(""), Err(SortRuleError::Empty));
	assert!(matches!(decode_rules("artist  album"), Err(SortRuleError::InvalidKey { .. })));
	assert!(matches!(decode_rules("mood"), Err(SortRuleError::InvalidKey { .. })));
	assert!(matches!(decode_rules("album/up"), Err(SortRuleError::InvalidOrder { .. })));
}

#[test]
fn shuffle_is_a_permutation_for_every_configuration() {
	let mixed = population()
		.into_iter()
		.enumerate()
		.map(|(i, track)| {
			track.with_artist(format!("Artist {}", i % 3)).with_album(format!("Album {}", i % 4))
		})
		.collect::<Vec<_>>();
	let single_artist = (0..12)
		.map(|i| Track::new(format!("s{i}"), "Same").with_artist("Solo").with_album("Only"))
		.collect::<Vec<_>>();
	let mut rng = StdRng::seed_from_u64(7);

	for tracks in [&mixed, &single_artist] {
		let mut expected = ids(tracks);

		expected.sort();

		for weighted in
			[ShuffleWeight::Random, ShuffleWeight::PopularityHigh, ShuffleWeight::PopularityLow]
		{
			for (artist, album) in [(false, false), (true, false), (false, true), (true, true)] {
				let config = ShuffleConfig { weighted, smart: SmartSeparation { artist, album } };
				let mut shuffled = ids(&shuffle_tracks_with(tracks, &config, &mut rng));

				shuffled.sort();

				assert_eq!(shuffled, expected, "{config:?} lost or duplicated tracks");
			}
		}
	}
}

#[test]
fn popularity_weighting_biases_the_head_of_the_playlist() {
	let high = popular_in_top_twenty(ShuffleWeight::PopularityHigh);
	let low = popular_in_top_twenty(ShuffleWeight::PopularityLow);
	let random = popular_in_top_twenty(ShuffleWeight::Random);

	assert!(high > 14.0, "popularity-high placed {high} popular tracks in the top 20");
	assert!(low < 6.0, "popularity-low placed {low} popular tracks in the top 20");
	assert!((7.0..13.0).contains(&random), "random placed {random} popular tracks in the top 20");
}

#[test]
fn artist_separation_interleaves_runs_of_one_artist() {
	let tracks = ["a1", "a2", "a3", "b1", "b2", "b3"]
		.into_iter()
		.map(|id| Track::new(id, id).with_artist(&id[..1]))
		.collect::<Vec<_>>();
	let separated = separate(tracks, SmartSeparation { artist: true, album: false });

	assert_eq!(
		separated.iter().map(|track| track.id.as_str()).collect::<Vec<_>>(),
		["a1", "b1", "a2", "b2", "a3", "b3"]
	);
}

#[test]
fn sort_mode_is_idempotent_through_reorder_mode() {
	let mode = ReorderMode::Sort(decode_rules("title").expect("Title rule should decode."));
	let (once, changed) = mode.apply(vec![Track::new("b", "Banana"), Track::new("a", "Apple")]);
	let (twice, changed_again) = mode.apply(once.clone());

	assert!(changed);
	assert!(!changed_again);
	assert_eq!(once, twice);
}
