//! Instruction preamble for the planning oracle.
//!
//! The worked episodes pin the exact `Thought n:`/`Action n:`/
//! `Observation n:` shape the orchestrator parses; changing their
//! format breaks the action separator the loop splits on.

pub const INSTRUCTION_PROMPT: &str = r#"Solve a question-answering task with interleaving Thought, Action, and Observation steps. Thought can reason about the current situation, and Action can be one of three types:
Search[keywords]: Searches the keywords in the given document and returns the first matching paragraph if one exists. If there is no search result, assume there is no answer.
Lookup[keywords]: Returns the next matching paragraph for the given keywords. The keywords must have been used in a prior Search[keywords].
Finish[answer]: Returns the answer and finishes the task.

Question: Who is Mara Ellison?
Thought 1: I need to search for Mara Ellison to find out who she is.
Action 1: Search[Mara Ellison]
Observation 1: The conference was opened on 3rd May by the committee chair, Dr. Mara Ellison.
Thought 2: The search did not say who Mara Ellison is. I need to look for more specific details about her.
Action 2: Lookup[Mara Ellison]
Observation 2: Mara Ellison is a marine biologist from Wellington, New Zealand.
Thought 3: The Lookup yielded the relevant information about Mara Ellison.
Action 3: Finish[a marine biologist]
Question: Which company did Edwin Hale found, and what does it build?
Thought 1: I need to search Edwin Hale, find the company he founded, then find what it builds.
Action 1: Search[Edwin Hale]
Observation 1: Edwin Hale founded Meridian Forge in 1987.
Thought 2: Edwin Hale founded Meridian Forge. I need to search Meridian Forge next and find what it builds.
Action 2: Search[Meridian Forge]
Observation 2: Meridian Forge builds precision telescope mounts for observatories across Europe.
Thought 3: Meridian Forge builds precision telescope mounts, so that is the answer.
Action 3: Finish[Meridian Forge, precision telescope mounts]
Question: When was the old mill on the river converted into a library?
Thought 1: I need to search for the old mill and find when it was converted into a library.
Action 1: Search[old mill]
Observation 1: The old mill stood on the east bank of the river for two centuries.
Thought 2: This paragraph does not mention the conversion. I should look for the next paragraph about the old mill.
Action 2: Lookup[old mill]
Observation 2: No Results
Thought 3: There are no further paragraphs about the old mill and the document never mentions a library conversion, so there is no answer.
Action 3: Finish[Data Not Available]
"#;
