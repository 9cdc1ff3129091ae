//! Sample consultation transcripts.
//!
//! Used as shared test fixtures and for demos of the parser output.

/// Routine visit with every vital sign read out numerically.
pub const ROUTINE_VISIT: &str = "Today is March 15th, 2024.
Doctor: Good morning, I'm Dr. Patel. Can you tell me your name?
Patient: My name is Sarah Johnson.
Doctor: And how old are you?
Patient: I'm 45 years old.
Doctor: So you're a 45 year old female?
Patient: Yes, that's right.
Doctor: What brings you in today?
Patient: I've been having a sore throat and a mild fever. It started three days ago and has been getting worse at night.
Doctor: Any cough or shortness of breath?
Patient: No cough, no shortness of breath.
Doctor: Do you have any medical conditions?
Patient: I have high blood pressure.
Doctor: Are you taking any medications?
Patient: I'm taking lisinopril 10 mg daily.
Doctor: Any allergies?
Patient: I'm allergic to penicillin.
Doctor: Let me check your vitals. Temperature is 100.4 degrees Fahrenheit, pulse rate 88 beats per minute, blood pressure 130/85 mmHg, respiratory rate 16 per minute, glucose 102 mg/dL.
On examination, your throat is red with swollen tonsils.
I think this is strep throat. I'm going to order a strep test.
I'm going to prescribe azithromycin for five days. Follow up in one week if you're not feeling better.";

/// Visit where the pulse and blood pressure equipment fails and the doctor
/// narrates the problem instead of a reading.
pub const EQUIPMENT_MALFUNCTION: &str = "Doctor: Hello, I'm Dr. Smith. What's your name?
Patient: My name is James Bond.
Doctor: How old are you, Mr. Bond?
Patient: I'm 33 years old.
Doctor: And for the record, you're male?
Patient: Yes, male.
Doctor: What brings you in today?
Patient: I've been having a persistent headache and some dizziness. It started about five days ago and has been getting worse.
Doctor: Any nausea or vomiting?
Patient: No nausea, no vomiting.
Doctor: Are you taking any medications?
Patient: I'm taking ibuprofen 400 mg as needed and a multivitamin.
Doctor: Any allergies?
Patient: No known drug allergies.
Doctor: Let me check your pulse rate... hmm, I'm not getting a clear reading, let me try again.
Now your blood pressure... the cuff seems to be malfunctioning, we'll need to get another one.
Your temperature is normal and your breathing looks normal. We'll check your blood sugar later.
On examination, your pupils are equal and reactive and your neck is supple.
I think this is most likely a tension headache.
I'd also like to order a CT scan of your head to be safe.
I'm going to prescribe naproxen 500 mg twice daily. Follow up in two weeks if the headaches persist.";
