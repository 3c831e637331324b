//! Prompt building functions for story generation requests

use crate::domain::value_objects::StorySettings;

/// The JSON shape every story prompt asks the model to produce
fn response_contract(prompt: &mut String, language: &str, game_over: &str) {
    prompt.push_str(
        "Make sure your entire response is a single valid JSON object with the following structure:\n",
    );
    prompt.push_str("{\n");
    prompt.push_str(&format!("  \"narrative\": \"string (in {})\",\n", language));
    prompt.push_str("  \"imagePrompt\": \"string (in English)\",\n");
    prompt.push_str(&format!(
        "  \"choices\": [\"string (in {0})\", \"string (in {0})\", \"string (in {0})\"],\n",
        language
    ));
    prompt.push_str(&format!("  \"isGameOver\": {}\n", game_over));
    prompt.push_str("}\n");
    prompt.push_str("Do not include any text outside this JSON object. ");
    prompt.push_str("Do not use markdown formatting for the JSON.\n");
}

fn storyteller_header(prompt: &mut String, role: &str, player_name: &str, theme: &str, language: &str) {
    prompt.push_str(&format!(
        "System Instruction: You are a master storyteller {} an interactive text adventure game in {}.\n",
        role, language
    ));
    prompt.push_str(&format!("The player's name is {}.\n", player_name));
    prompt.push_str(&format!("The theme of the game is \"{}\".\n", theme));
}

/// Prompt for the first scene of a new game. No history is supplied.
pub fn build_opening_prompt(player_name: &str, theme: &str, settings: &StorySettings) -> String {
    let language = settings.language.as_str();
    let mut prompt = String::new();

    storyteller_header(&mut prompt, "creating", player_name, theme, language);
    prompt.push_str(&format!(
        "Start the game with an intriguing introductory scenario in {}.\n",
        language
    ));

    prompt.push_str("Generate:\n");
    prompt.push_str(&format!(
        "1. A short story paragraph for the current scene (about 100-150 words) in {}.\n",
        language
    ));
    prompt.push_str(
        "2. A concise, vivid image prompt IN ENGLISH (10-15 words max, suitable for an AI image \
         generator) that visually represents this scene. Focus on key elements, atmosphere and \
         style. Example: \"Ancient glowing rune stone, misty forest path, ethereal light\".\n",
    );
    prompt.push_str(&format!(
        "3. Exactly 3 distinct, engaging choices for the player to continue the adventure, in {}. \
         Each choice should be a short sentence.\n",
        language
    ));

    response_contract(&mut prompt, language, "false");
    prompt
}

/// Prompt for the scene that follows the player's choice.
///
/// The previous narrative and the chosen option are embedded verbatim.
pub fn build_continuation_prompt(
    previous_narrative: &str,
    chosen_option: &str,
    player_name: &str,
    theme: &str,
    settings: &StorySettings,
) -> String {
    let language = settings.language.as_str();
    let mut prompt = String::new();

    storyteller_header(&mut prompt, "continuing", player_name, theme, language);
    prompt.push_str(&format!(
        "The story of the previous scene was: \"{}\".\n",
        previous_narrative
    ));
    prompt.push_str(&format!("The player chose: \"{}\".\n\n", chosen_option));

    prompt.push_str(&format!(
        "Based on the player's choice, continue the story in {}. Make it engaging and make sure \
         it follows logically from the choice.\n",
        language
    ));
    prompt.push_str(
        "The story may lead to discovery, danger, resolution, or even a game over state.\n",
    );

    prompt.push_str("Generate:\n");
    prompt.push_str(&format!(
        "1. A new short story paragraph for the current scene (about 100-150 words) in {}.\n",
        language
    ));
    prompt.push_str(
        "2. A concise, vivid image prompt IN ENGLISH (10-15 words max) for the new scene. \
         Example: \"Dark cave entrance, dripping water, faint torchlight\".\n",
    );
    prompt.push_str(&format!(
        "3. Exactly 3 distinct choices for the player relevant to the new scene, in {}. \
         If the game ends, the story must clearly state the ending (success or failure), \
         \"isGameOver\" must be true and the choices array must contain a single option such as \
         \"{}\". If the game does not end, provide 3 choices.\n",
        language, settings.play_again_label
    ));

    response_contract(&mut prompt, language, "boolean");
    prompt
}
