//! Parsing and segmenting real-shaped slicer output in every dialect

use gradientkit_gcode::{
    split_lines, GcodeParser, Layer, LayerSegmenter, OutputLine, ParsePolicy, RecognizerRegistry,
    Region, SlicerDialect, StreamWriter,
};

const PRUSA: &str = concat!(
    "; generated by PrusaSlicer 2.7.1+linux-x64 on 2024-03-01 at 10:00:00 UTC\n",
    "M83 ; use relative distances for extrusion\n",
    ";LAYER_CHANGE\n",
    ";Z:0.2\n",
    "G1 Z.2 F7800\n",
    ";TYPE:External perimeter\n",
    "G1 X0 Y0\n",
    "G1 X10 Y0 E.5\n",
    "G1 X10 Y10 E.5\n",
    ";TYPE:Internal infill\n",
    "G1 X5 Y5 E.3\n",
    ";LAYER_CHANGE\n",
    ";Z:0.4\n",
    "G1 X1 Y1 E.1\n",
);

const CURA: &str = concat!(
    ";FLAVOR:Marlin\n",
    ";Generated with Cura_SteamEngine 5.6.0\n",
    "M83\n",
    ";LAYER:0\n",
    ";TYPE:WALL-OUTER\n",
    "G1 X0 Y0 E0.1\n",
    ";TYPE:FILL\n",
    "G1 X5 Y5 E0.3\n",
    ";LAYER:1\n",
    ";TYPE:SKIN\n",
    "G1 X6 Y6 E0.3\n",
);

const ORCA_FOR_BAMBU: &str = concat!(
    "; generated by OrcaSlicer 2.1.0\n",
    "M83\n",
    "; CHANGE_LAYER\n",
    "; FEATURE: Inner wall\n",
    "G1 X0 Y0 E0.1\n",
    "; FEATURE: Sparse infill\n",
    "G1 X5 Y5 E0.3\n",
    "; printer_model = Bambu Lab P1S\n",
);

fn layers(input: &str) -> (SlicerDialect, Vec<Layer>) {
    let dialect = SlicerDialect::detect(split_lines(input).map(|(text, _)| text)).unwrap();
    let parser = GcodeParser::new(dialect.recognizer());
    let stream = parser.parse_stream(input, ParsePolicy::Strict).unwrap();
    (dialect, LayerSegmenter::new().segment(stream.records))
}

fn regions(layer: &Layer) -> Vec<Region> {
    layer
        .records
        .iter()
        .filter(|r| r.is_extruding_xy_move())
        .map(|r| r.region)
        .collect()
}

#[test]
fn test_prusa_layers_and_regions() {
    let (dialect, layers) = layers(PRUSA);
    assert_eq!(dialect, SlicerDialect::Prusa);
    assert_eq!(layers.len(), 3);
    assert_eq!(
        regions(&layers[1]),
        vec![Region::Wall, Region::Wall, Region::Infill]
    );
    assert_eq!(layers[1].walls.segment_count(), 2);
    // Region resets on the next layer
    assert_eq!(regions(&layers[2]), vec![Region::Unknown]);
}

#[test]
fn test_cura_layers_and_regions() {
    let (dialect, layers) = layers(CURA);
    assert_eq!(dialect, SlicerDialect::Cura);
    assert_eq!(layers.len(), 3);
    assert_eq!(regions(&layers[1]), vec![Region::Wall, Region::Infill]);
    assert_eq!(regions(&layers[2]), vec![Region::Skin]);
}

#[test]
fn test_orca_targeting_bambu_uses_feature_comments() {
    let (dialect, layers) = layers(ORCA_FOR_BAMBU);
    assert_eq!(dialect, SlicerDialect::Bambu);
    assert_eq!(layers.len(), 2);
    assert_eq!(regions(&layers[1]), vec![Region::Wall, Region::Infill]);
}

#[test]
fn test_untouched_stream_round_trips_byte_for_byte() {
    for input in [PRUSA, CURA, ORCA_FOR_BAMBU] {
        let (_, layers) = layers(input);
        let lines: Vec<OutputLine> = layers
            .iter()
            .flat_map(|layer| layer.records.iter())
            .map(|scanned| OutputLine::verbatim(&scanned.record))
            .collect();
        assert_eq!(StreamWriter::join(&lines), input);
    }
}

#[test]
fn test_registry_recognizers_match_dialects() {
    let registry = RecognizerRegistry::default();
    for dialect in SlicerDialect::ALL {
        let recognizer = registry.create(dialect.name()).unwrap();
        assert_eq!(recognizer.name(), dialect.name());
    }
}
