use air_guitar::chord::{ChordLabel, ChordMapper, STANDARD_TUNING};

fn main() {
    let mapper = ChordMapper::default();

    println!("Tuning: {:?}\n", STANDARD_TUNING);
    println!("{:<6} {:<28} {}", "Chord", "Voicing", "Pluck");

    for label in ChordLabel::all() {
        let voicing = mapper.voice(label);
        let pluck = match voicing.pluck {
            Some(notes) => format!("{:?}", notes),
            None => "✗ no playable voicing".to_string(),
        };
        println!("{:<6} {:<28} {}", label.to_string(), format!("{:?}", voicing.notes), pluck);
    }
}
