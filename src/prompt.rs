//! Instruction templates for every generation pathway.
//!
//! Everything here is pure string composition: the same mode and options
//! always produce the same instruction, with no I/O and no clock. Each
//! instruction is made of a mode-specific skeleton plus three optional
//! clauses:
//!
//! - **Audience**: who the output is written for (falls back to a generic
//!   professional-reader framing where the mode needs a persona)
//! - **Purpose**: fixed strategy clause per [`Purpose`]; omitted when absent
//! - **Context**: grounding text; omitted when absent
//!
//! The user-turn contents are built separately by [`build_contents`]. For
//! [`Mode::Reconstruct`] the contents never carry the caller's text: the
//! model works from the verified logic in the instruction alone.

use linguaflow_common::{Mode, Purpose};

/// Language pair the translator swaps between.
pub const LANGUAGE_A: &str = "English";
pub const LANGUAGE_B: &str = "Simplified Chinese";

/// Fixed user turn for reconstruction.
pub const RECONSTRUCT_DIRECTIVE: &str =
    "Write the final text now, using only the verified logic and context given in your instructions.";

/// Sampling temperature for context inference.
pub const CONTEXT_INFERENCE_TEMPERATURE: f32 = 0.5;

const LOW_TEMPERATURE: f32 = 0.3;
const DECONSTRUCT_TEMPERATURE: f32 = 0.4;
const REWRITE_TEMPERATURE: f32 = 0.7;

/// Optional inputs that shape an instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PromptOptions<'a> {
    pub purpose: Option<Purpose>,
    pub audience: Option<&'a str>,
    pub context: Option<&'a str>,
}

impl<'a> PromptOptions<'a> {
    pub fn new(purpose: Option<Purpose>, audience: Option<&'a str>, context: Option<&'a str>) -> Self {
        Self {
            purpose,
            audience,
            context,
        }
    }

    fn audience(&self) -> Option<&'a str> {
        self.audience.map(str::trim).filter(|a| !a.is_empty())
    }

    fn context(&self) -> Option<&'a str> {
        self.context.map(str::trim).filter(|c| !c.is_empty())
    }
}

/// A system instruction together with its sampling temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub text: String,
    pub temperature: f32,
}

/// Fixed strategy clause for a text purpose.
pub fn purpose_clause(purpose: Purpose) -> &'static str {
    match purpose {
        Purpose::Informative => {
            "PRIMARY GOAL: ACCURACY & CLARITY. This is an informative text. Convey facts and \
             knowledge precisely, in a neutral, objective and clear register."
        }
        Purpose::Expressive => {
            "PRIMARY GOAL: AESTHETICS & STYLE. This is an expressive text. Preserve the author's \
             voice, artistic form and stylistic nuance; the result should be as evocative as the original."
        }
        Purpose::Operative => {
            "PRIMARY GOAL: PERSUASION & IMPACT. This is an operative text. Write for the reader's \
             response: the result must be persuasive, engaging and move the audience to act."
        }
    }
}

/// Temperature used for a mode.
///
/// For [`Mode::Proofread`] this is the temperature of the polishing pass;
/// its literal draft pass uses the [`Mode::Translate`] temperature.
pub fn temperature_for(mode: Mode) -> f32 {
    match mode {
        Mode::Translate | Mode::BackgroundSummary | Mode::Reconstruct => LOW_TEMPERATURE,
        Mode::Deconstruct => DECONSTRUCT_TEMPERATURE,
        Mode::Polish | Mode::Proofread => REWRITE_TEMPERATURE,
    }
}

/// Build the system instruction for a mode.
pub fn build_instruction(mode: Mode, options: &PromptOptions<'_>) -> Instruction {
    let text = match mode {
        Mode::Translate => translate_skeleton(options),
        Mode::Polish | Mode::Proofread => polish_skeleton(options),
        Mode::BackgroundSummary => background_summary_skeleton(options),
        Mode::Deconstruct => deconstruct_skeleton(options),
        Mode::Reconstruct => reconstruct_skeleton(options),
    };
    Instruction {
        text,
        temperature: temperature_for(mode),
    }
}

/// Build the user-turn contents for a mode.
///
/// Reconstruction ignores `text` entirely and returns
/// [`RECONSTRUCT_DIRECTIVE`].
pub fn build_contents(mode: Mode, text: &str) -> String {
    match mode {
        Mode::Translate => text.to_string(),
        Mode::Polish | Mode::Proofread => format!(
            "Here is a draft translation:\n\"{}\"\n\nRewrite it to be natural and idiomatic.",
            text
        ),
        Mode::BackgroundSummary => format!("TEXT TO ANALYZE:\n\"{}\"", text),
        Mode::Deconstruct => format!("SOURCE TEXT:\n\"{}\"", text),
        Mode::Reconstruct => RECONSTRUCT_DIRECTIVE.to_string(),
    }
}

/// Join the (possibly edited) background insight and the verified logic
/// into the labelled context handed to reconstruction.
pub fn combined_context(background_summary: &str, verified_logic: &str) -> String {
    format!(
        "BACKGROUND INSIGHTS:\n{}\n\nVERIFIED LOGIC:\n{}",
        background_summary, verified_logic
    )
}

/// User-turn contents for document-level context inference.
pub fn build_context_inference_contents(sample: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str("Analyze the following text (a full document or a large excerpt).\n");
    prompt.push_str(
        "Identify the core topic, the document type (e.g. technical manual, novel, legal contract), \
         the intended audience, and the general tone.\n",
    );
    prompt.push_str(
        "Summarize this translation context in one concise paragraph (under 100 words) \
         to help a translator understand the background.\n\n",
    );
    prompt.push_str(&format!("Text:\n\"{}\"", sample));
    prompt
}

// ── Clauses ───────────────────────────────────────────────────────────

fn push_purpose(prompt: &mut String, heading: &str, options: &PromptOptions<'_>) {
    if let Some(purpose) = options.purpose {
        prompt.push_str(&format!("\n[{}]\n{}\n", heading, purpose_clause(purpose)));
    }
}

fn push_context(prompt: &mut String, heading: &str, usage: &str, options: &PromptOptions<'_>) {
    if let Some(context) = options.context() {
        prompt.push_str(&format!("\n[{}]\n{}\nIMPORTANT: {}\n", heading, context, usage));
    }
}

fn audience_role(options: &PromptOptions<'_>) -> String {
    match options.audience() {
        Some(audience) => format!(
            "ROLE: You are a member of the target audience: \"{audience}\".\n\
             You are not merely an editor; you read as one of this group and the text must \
             resonate with you and your peers.\n\
             Adopt the vocabulary, reading level, tone and stylistic expectations typical of \"{audience}\".\n"
        ),
        None => "ROLE: You are a world-class editor acting on behalf of general professional readers.\n"
            .to_string(),
    }
}

// ── Skeletons ─────────────────────────────────────────────────────────

fn translate_skeleton(options: &PromptOptions<'_>) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "You are a fast, precise bilingual translator ({LANGUAGE_A} <-> {LANGUAGE_B}).\n\
         Detect the source language and translate literally and faithfully into the other language:\n\
         - If the source is {LANGUAGE_B}, translate into {LANGUAGE_A}.\n\
         - If the source is {LANGUAGE_A}, translate into {LANGUAGE_B}.\n"
    ));
    push_purpose(&mut prompt, "TEXT PURPOSE", options);
    push_context(
        &mut prompt,
        "CONTEXT FOR MEANING & ACCURACY",
        "Use this background strictly to resolve ambiguities in the source and to keep terminology accurate.",
        options,
    );
    prompt.push_str("\nPreserve the original meaning strictly. Do not paraphrase freely.\n");
    prompt.push_str("Do not add explanations or notes. Output only the translated text.\n");
    prompt
}

fn polish_skeleton(options: &PromptOptions<'_>) -> String {
    let mut prompt = audience_role(options);
    push_purpose(&mut prompt, "TEXT PURPOSE & STRATEGY", options);
    push_context(
        &mut prompt,
        "CONTEXT FOR TONE & STYLE",
        "Use this background to choose the right register, atmosphere and stylistic nuance.",
        options,
    );
    prompt.push_str(&format!(
        "\nYour task is to rewrite the provided draft translation into professional, native-sounding text.\n\
         1. Detect the language of the draft.\n\
         2. Keep the SAME language: refine {LANGUAGE_A} into native-level {LANGUAGE_A}, \
         {LANGUAGE_B} into native-level {LANGUAGE_B}.\n"
    ));
    prompt.push_str(
        "\nBLIND EDITOR MODE:\n\
         - Ignore the sentence structure of whatever language the draft was translated from.\n\
         - Seek equivalence of impact and logic, not of structure.\n\
         - Any sentence that reads as translated (translationese) must be rewritten completely.\n\
         - Focus only on flow, tone and idiomatic expression suited to your role and the text's purpose.\n\
         Do not add explanations or notes. Output only the refined text.\n",
    );
    prompt
}

fn background_summary_skeleton(options: &PromptOptions<'_>) -> String {
    let mut prompt = String::new();
    prompt.push_str("ROLE: You are a senior language strategist and domain expert.\n");
    prompt.push_str("TASK: Passage insight - contextualize the passage before it is translated.\n");
    if let Some(context) = options.context() {
        prompt.push_str(&format!(
            "\nGLOBAL DOCUMENT CONTEXT:\n\"{}\"\n\
             Use this to understand the broader domain, but focus your analysis on the passage itself.\n",
            context
        ));
    }
    prompt.push_str(
        "\n1. Read the passage.\n\
         2. Identify its specific micro-domain (e.g. \"central bank collateral frameworks\" rather than \"finance\").\n\
         3. Define 3-5 key terms from the passage that are critical for an accurate translation.\n\
         4. Flag false friends and likely ambiguity pitfalls.\n",
    );
    prompt.push_str(
        "\nOUTPUT FORMAT: a structured passage-insight note.\n\
         - **Domain Context**: one sentence\n\
         - **Key Definitions**: term: definition in this context\n\
         - **Pitfalls**: warnings\n\
         Keep it concise and actionable for a professional translator.\n",
    );
    prompt
}

fn deconstruct_skeleton(options: &PromptOptions<'_>) -> String {
    let mut prompt = String::new();
    prompt.push_str("ROLE: You are the layman in the loop, a smart non-expert.\n");
    prompt.push_str("TASK: Deep deconstruction - explain what the passage means, not what it says.\n");
    push_context(
        &mut prompt,
        "CONTEXT",
        "Use this background to resolve ambiguities and to read the terminology correctly.",
        options,
    );
    if let Some(audience) = options.audience() {
        prompt.push_str(&format!(
            "\nTARGET AUDIENCE NOTE: the final text is for \"{}\". Your explanation must be clear \
             enough to support that level of communication later, but right now explain it simply.\n",
            audience
        ));
    }
    prompt.push_str(
        "\n1. Explain the passage to a complete outsider, such as a high-school student.\n\
         2. Do not translate word for word. Break the sentence structures apart and extract the logic.\n\
         3. Tell the story of the passage in simple, colloquial language; use analogies where they help.\n",
    );
    prompt.push_str(&format!(
        "\nLANGUAGE RULE:\n\
         1. Detect the language of the source text.\n\
         2. Write your explanation in the OPPOSITE language:\n\
         - If the source is {LANGUAGE_A}, explain in simple {LANGUAGE_B}.\n\
         - If the source is {LANGUAGE_B}, explain in simple {LANGUAGE_A}.\n\
         3. The whole explanation, including the question below, must be in that opposite language.\n"
    ));
    prompt.push_str(
        "\nOUTPUT FORMAT: one paragraph of layman's logic, then end with a single verification \
         question to the professional: \"Did I understand [the key concept] correctly?\"\n",
    );
    prompt
}

fn reconstruct_skeleton(options: &PromptOptions<'_>) -> String {
    let mut prompt = audience_role(options);
    prompt.push_str("TASK: Passage reconstruction - write the final text.\n");
    prompt.push_str(
        "\nYou do NOT have the original source passage and must not try to recreate its structure.\n\
         Write from scratch, using only the material below.\n",
    );
    match options.context() {
        Some(context) => prompt.push_str(&format!(
            "\n[VERIFIED LOGIC & CONTEXT]\n{}\n\
             The verified logic has been checked by a human expert: trust it for WHAT is said. \
             Use the background insights for terminology and domain conventions.\n",
            context
        )),
        None => prompt.push_str("\n[VERIFIED LOGIC & CONTEXT]\n(none supplied)\n"),
    }
    push_purpose(&mut prompt, "TEXT PURPOSE & STRATEGY", options);
    prompt.push_str(
        "\nLANGUAGE RULE: the verified logic is already written in the target language. \
         Your output must be in the SAME language as the verified logic.\n\
         Express that logic with the context terms in the most natural, professional way, \
         tailoring vocabulary and tone to your audience.\n\
         Output only the final text. No notes.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts<'a>(
        purpose: Option<Purpose>,
        audience: Option<&'a str>,
        context: Option<&'a str>,
    ) -> PromptOptions<'a> {
        PromptOptions::new(purpose, audience, context)
    }

    #[test]
    fn test_identical_inputs_give_identical_instructions() {
        for mode in Mode::ALL {
            let o = opts(Some(Purpose::Expressive), Some("Poets"), Some("A sonnet"));
            assert_eq!(build_instruction(mode, &o), build_instruction(mode, &o));
        }
    }

    #[test]
    fn test_purpose_clause_included_only_when_present() {
        let with = build_instruction(Mode::Polish, &opts(Some(Purpose::Operative), None, None));
        assert!(with.text.contains(purpose_clause(Purpose::Operative)));

        let without = build_instruction(Mode::Polish, &opts(None, None, None));
        for purpose in Purpose::ALL {
            assert!(!without.text.contains(purpose_clause(purpose)));
        }
        assert!(!without.text.contains("PRIMARY GOAL"));
    }

    #[test]
    fn test_each_purpose_has_its_own_clause() {
        assert!(purpose_clause(Purpose::Informative).contains("ACCURACY"));
        assert!(purpose_clause(Purpose::Expressive).contains("AESTHETICS"));
        assert!(purpose_clause(Purpose::Operative).contains("PERSUASION"));
    }

    #[test]
    fn test_audience_framing_vs_generic_reader() {
        let with = build_instruction(Mode::Polish, &opts(None, Some("Legal Professionals"), None));
        assert!(with.text.contains("member of the target audience: \"Legal Professionals\""));
        assert!(!with.text.contains("general professional readers"));

        let without = build_instruction(Mode::Polish, &opts(None, Some("  "), None));
        assert!(without.text.contains("general professional readers"));
    }

    #[test]
    fn test_context_usage_depends_on_mode() {
        let ctx = Some("Central bank collateral policy");
        let translate = build_instruction(Mode::Translate, &opts(None, None, ctx));
        assert!(translate.text.contains("CONTEXT FOR MEANING & ACCURACY"));
        assert!(translate.text.contains("resolve ambiguities"));

        let polish = build_instruction(Mode::Polish, &opts(None, None, ctx));
        assert!(polish.text.contains("CONTEXT FOR TONE & STYLE"));
        assert!(polish.text.contains("register"));

        let deconstruct = build_instruction(Mode::Deconstruct, &opts(None, None, ctx));
        assert!(deconstruct.text.contains("Central bank collateral policy"));
        assert!(deconstruct.text.contains("terminology"));
    }

    #[test]
    fn test_absent_context_omits_clause() {
        let translate = build_instruction(Mode::Translate, &opts(None, None, None));
        assert!(!translate.text.contains("CONTEXT FOR MEANING"));
        let summary = build_instruction(Mode::BackgroundSummary, &opts(None, None, Some("")));
        assert!(!summary.text.contains("GLOBAL DOCUMENT CONTEXT"));
    }

    #[test]
    fn test_background_summary_anchors_on_global_context() {
        let summary = build_instruction(
            Mode::BackgroundSummary,
            &opts(None, None, Some("A technical guide on collateral eligibility")),
        );
        assert!(summary.text.contains("GLOBAL DOCUMENT CONTEXT"));
        assert!(summary.text.contains("micro-domain"));
        assert!(summary.text.contains("Pitfalls"));
    }

    #[test]
    fn test_deconstruct_switches_language_and_asks_question() {
        let text = build_instruction(Mode::Deconstruct, &opts(None, Some("Junior Bankers"), None)).text;
        assert!(text.contains("OPPOSITE language"));
        assert!(text.contains("Did I understand"));
        assert!(text.contains("Junior Bankers"));
    }

    #[test]
    fn test_translate_is_literal_and_bidirectional() {
        let text = build_instruction(Mode::Translate, &opts(None, None, None)).text;
        assert!(text.contains(LANGUAGE_A));
        assert!(text.contains(LANGUAGE_B));
        assert!(text.contains("literally"));
    }

    #[test]
    fn test_polish_keeps_draft_language_and_forbids_translationese() {
        let text = build_instruction(Mode::Polish, &opts(None, None, None)).text;
        assert!(text.contains("SAME language"));
        assert!(text.contains("translationese"));
    }

    #[test]
    fn test_reconstruct_carries_context_and_same_language_rule() {
        let ctx = combined_context("Domain: ECB collateral", "The bank keeps a safety margin.");
        let text = build_instruction(
            Mode::Reconstruct,
            &opts(Some(Purpose::Informative), None, Some(&ctx)),
        )
        .text;
        assert!(text.contains("VERIFIED LOGIC:\nThe bank keeps a safety margin."));
        assert!(text.contains("do NOT have the original source passage"));
        assert!(text.contains("SAME language as the verified logic"));
        assert!(text.contains(purpose_clause(Purpose::Informative)));
    }

    #[test]
    fn test_temperatures_per_mode() {
        assert_eq!(temperature_for(Mode::Translate), 0.3);
        assert_eq!(temperature_for(Mode::BackgroundSummary), 0.3);
        assert_eq!(temperature_for(Mode::Reconstruct), 0.3);
        assert_eq!(temperature_for(Mode::Deconstruct), 0.4);
        assert_eq!(temperature_for(Mode::Polish), 0.7);
        assert_eq!(temperature_for(Mode::Proofread), 0.7);
    }

    #[test]
    fn test_reconstruct_contents_ignore_caller_text() {
        let contents = build_contents(Mode::Reconstruct, "中文段落");
        assert_eq!(contents, RECONSTRUCT_DIRECTIVE);
        assert!(!contents.contains("中文段落"));
    }

    #[test]
    fn test_contents_wrap_text_per_mode() {
        assert_eq!(build_contents(Mode::Translate, "hello"), "hello");
        assert!(build_contents(Mode::Polish, "draft").contains("\"draft\""));
        assert!(build_contents(Mode::BackgroundSummary, "p").starts_with("TEXT TO ANALYZE"));
        assert!(build_contents(Mode::Deconstruct, "p").starts_with("SOURCE TEXT"));
    }

    #[test]
    fn test_combined_context_labels_sections() {
        let combined = combined_context("S", "L");
        assert_eq!(combined, "BACKGROUND INSIGHTS:\nS\n\nVERIFIED LOGIC:\nL");
    }

    #[test]
    fn test_context_inference_contents_embed_sample() {
        let contents = build_context_inference_contents("A novel about the sea.");
        assert!(contents.contains("under 100 words"));
        assert!(contents.ends_with("\"A novel about the sea.\""));
    }
}
