/// Class label a segment belongs to (one per genre directory).
/// Examples: `blues`, `hiphop`, `reggae`
pub type ClassLabel = String;
/// Identifier of the original recording a segment was cut from.
/// Examples: `blues.00024`, `jazz.00003`
pub type ParentId = String;
/// Forward-slash path string of one segment file.
/// Example: `./data/gtzan_10s/blues/blues.00024_1.wav`
pub type SegmentPath = String;
/// Column or key name used by the serializers.
/// Examples: `filepath`, `song_id`, `wav`, `labels`
pub type FieldName = String;
