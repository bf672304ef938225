//! End-to-end structured extraction scenarios (pipeline entry points over
//! reconstructed text, no OCR backend required).

use cvintel::pipeline::structured_candidate_from_text;

#[test]
fn single_job_entry_is_parsed_from_work_experience_section() {
    let text = "Jane Doe\n\
                Work Experience\n\
                Senior Software Engineer\n\
                Tech Solutions Inc. | 2020 - Present\n\
                - Led development\n\
                - Managed team of 5 developers\n";

    let candidate = structured_candidate_from_text(text).unwrap();
    assert_eq!(candidate.work_history.len(), 1);

    let job = &candidate.work_history[0];
    assert_eq!(job.job_title.value, "Senior Software Engineer");
    assert_eq!(job.company.value, "Tech Solutions Inc.");
    assert!(job.start_date.value.contains("2020"));
    assert!(job.end_date.value.to_lowercase().contains("present"));
    assert!(job.responsibilities.value.contains("Led development"));
    assert!(job.responsibilities.value.contains("Managed team of 5 developers"));
}

#[test]
fn two_jobs_are_parsed_in_document_order() {
    let text = "Jane Doe\n\
                Work Experience\n\
                Senior Software Engineer\n\
                Tech Solutions Inc. | 2020 - Present\n\
                - Led development\n\
                - Managed team of 5 developers\n\
                Junior Developer\n\
                Company B | 2018 - 2020\n\
                - Wrote tests\n";

    let candidate = structured_candidate_from_text(text).unwrap();
    assert_eq!(candidate.work_history.len(), 2);
    assert_eq!(candidate.work_history[0].job_title.value, "Senior Software Engineer");
    assert_eq!(candidate.work_history[1].job_title.value, "Junior Developer");
    assert_eq!(candidate.work_history[1].company.value, "Company B");
}

#[test]
fn education_entry_captures_degree_institution_and_year() {
    let text = "Jane Doe\n\
                Education\n\
                Master of Science in Computer Science\n\
                Stanford University | 2017\n";

    let candidate = structured_candidate_from_text(text).unwrap();
    assert_eq!(candidate.education.len(), 1);
    let record = &candidate.education[0];
    assert!(record.degree.value.starts_with("Master of Science"));
    assert_eq!(record.institution.value, "Stanford University");
    assert_eq!(record.graduation_year.value, "2017");
}

#[test]
fn merged_work_experience_header_is_recognised() {
    let text = "Jane Doe\nWORKEXPERIENCE\nEngineer at Acme | 2021 - Present\n- Did the work\n";
    let candidate = structured_candidate_from_text(text).unwrap();
    assert_eq!(candidate.work_history.len(), 1);
}

#[test]
fn tier1_personal_info_is_extracted_from_document_head() {
    let text = "John Michael Doe\n\
                New York, NY, USA\n\
                Email: john.doe@example.com\n\
                Phone: +1 (555) 123-4567\n";

    let candidate = structured_candidate_from_text(text).unwrap();
    assert_eq!(candidate.tier1.first_name.unwrap().value, "John");
    assert_eq!(candidate.tier1.email.unwrap().value, "john.doe@example.com");
    assert!(candidate.overall_confidence > 0.0);
}

#[test]
fn document_with_no_recognisable_personal_info_fails() {
    let err = structured_candidate_from_text("\n   \n\t\n").unwrap_err();
    assert!(matches!(err, cvintel::PipelineError::BadInput(_)));
}
