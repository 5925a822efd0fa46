use vbow::Vocabulary;

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "vocabs/ORBvoc.txt".to_string());

    // Load a DBoW2-format vocabulary and print a structural summary
    let voc = Vocabulary::from_file(&path).unwrap();
    println!("Vocabulary: {:#?}", voc);

    println!("Branching Factor: {}", voc.branching_factor());
    println!("Depth Levels: {}", voc.depth_levels());
    println!("Num Nodes: {}", voc.node_count());
    println!("First 5:");
    for id in 0..5 {
        if let Some(node) = voc.node(id) {
            println!("{:?}", node);
        }
    }
    println!("Num Words: {}", voc.word_count());
    println!("First 5:");
    for word_id in 0..5 {
        if let Some(word) = voc.word(word_id) {
            println!("{:?}", word);
        }
    }
}
